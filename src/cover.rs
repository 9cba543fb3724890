//! CoverAccessors (spec §4.2): uniform reads of domain, root, correlation
//! id, and edition from any envelope that carries a `Cover`.

use crate::convert::proto_to_uuid;
use crate::proto::{CommandBook, Cover, EventBook, Query};

pub const UNKNOWN_DOMAIN: &str = "unknown";
pub const DEFAULT_EDITION: &str = "angzarr";

/// Implemented by any envelope carrying a `Cover`; every accessor returns
/// the documented sentinel when the underlying field is absent, never
/// raises.
pub trait CoverExt {
    fn cover(&self) -> Option<&Cover>;

    fn domain(&self) -> &str {
        match self.cover().map(|c| c.domain.as_str()) {
            Some("") | None => UNKNOWN_DOMAIN,
            Some(d) => d,
        }
    }

    fn correlation_id(&self) -> &str {
        self.cover().map(|c| c.correlation_id.as_str()).unwrap_or("")
    }

    fn root_uuid(&self) -> Option<uuid::Uuid> {
        self.cover()?.root.as_ref().and_then(|r| proto_to_uuid(r).ok())
    }

    /// Hex-encodes the raw root bytes directly, independent of length —
    /// canonical 8-4-4-4-12 only falls out of `root_uuid` when the root
    /// happens to be exactly 16 bytes; any other length still hex-encodes
    /// here instead of reading as absent.
    fn root_id_hex(&self) -> Option<String> {
        self.cover()?.root.as_ref().map(|r| hex::encode(&r.value))
    }

    fn has_correlation_id(&self) -> bool {
        !self.correlation_id().is_empty()
    }

    fn edition(&self) -> &str {
        match self.cover().and_then(|c| c.edition.as_ref()).map(|e| e.name.as_str()) {
            Some("") | None => DEFAULT_EDITION,
            Some(name) => name,
        }
    }

    /// = domain
    fn routing_key(&self) -> String {
        self.domain().to_string()
    }

    /// = domain + ":" + hex(root)
    fn cache_key(&self) -> String {
        format!(
            "{}:{}",
            self.domain(),
            self.root_id_hex().unwrap_or_default()
        )
    }
}

impl CoverExt for EventBook {
    fn cover(&self) -> Option<&Cover> {
        self.cover.as_ref()
    }
}

impl CoverExt for CommandBook {
    fn cover(&self) -> Option<&Cover> {
        self.cover.as_ref()
    }
}

impl CoverExt for Query {
    fn cover(&self) -> Option<&Cover> {
        self.cover.as_ref()
    }
}

impl CoverExt for Cover {
    fn cover(&self) -> Option<&Cover> {
        Some(self)
    }
}
