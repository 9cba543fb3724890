//! Type-URL construction/matching and the UUID/timestamp conversions the
//! wire types are built from.

use uuid::Uuid;

use crate::error::{DispatchError, DispatchResult};
use crate::proto::Uuid as ProtoUuid;

pub const TYPE_URL_PREFIX: &str = "type.googleapis.com";

/// Build a fully-qualified type URL from a message type name.
pub fn type_url(type_name: &str) -> String {
    format!("{TYPE_URL_PREFIX}/{type_name}")
}

/// Extract the terminal segment of a type URL: everything after the last
/// `/`, or the whole string when there's no `/` to split on. Deliberately
/// not a further split on `.` — see DESIGN.md's note on this fallback.
pub fn type_name_from_url(type_url: &str) -> &str {
    match type_url.rfind('/') {
        Some(idx) => &type_url[idx + 1..],
        None => type_url,
    }
}

/// Whether `type_url` ends in `suffix` — the core's only notion of a
/// type match.
pub fn type_url_matches(type_url: &str, suffix: &str) -> bool {
    let (url_len, suffix_len) = (type_url.len(), suffix.len());
    suffix_len <= url_len
        && type_url
            .get(url_len - suffix_len..)
            .is_some_and(|tail| tail == suffix)
}

pub fn uuid_to_proto(uuid: Uuid) -> ProtoUuid {
    let value = uuid.as_bytes().to_vec();
    ProtoUuid { value }
}

pub fn proto_to_uuid(proto: &ProtoUuid) -> DispatchResult<Uuid> {
    match Uuid::from_slice(&proto.value) {
        Ok(uuid) => Ok(uuid),
        Err(e) => Err(DispatchError::InvalidArgument(format!("invalid UUID: {e}"))),
    }
}

/// Parse an RFC3339 timestamp string into a protobuf `Timestamp`.
pub fn parse_timestamp(rfc3339: &str) -> DispatchResult<prost_types::Timestamp> {
    use chrono::DateTime;

    let dt = rfc3339
        .parse::<DateTime<chrono::Utc>>()
        .map_err(|e| DispatchError::InvalidTimestamp(format!("{rfc3339}: {e}")))?;

    Ok(prost_types::Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    })
}

/// Format a protobuf `Timestamp` as RFC3339 with nanosecond precision.
pub fn format_timestamp(ts: &prost_types::Timestamp) -> Option<String> {
    use chrono::{DateTime, SecondsFormat, Utc};

    let dt = DateTime::<Utc>::from_timestamp(ts.seconds, ts.nanos as u32)?;
    Some(dt.to_rfc3339_opts(SecondsFormat::Nanos, true))
}
