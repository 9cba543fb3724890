//! Edition helpers: the default/empty edition names the main timeline;
//! any other name denotes a speculative or branched timeline with its own
//! per-domain divergence points.

use crate::proto::{DomainDivergence, Edition};

/// Sentinel for "no divergence recorded" on a `DomainDivergence`.
pub const NO_DIVERGENCE: i32 = -1;

pub trait EditionExt {
    fn main_timeline() -> Edition {
        Edition {
            name: String::new(),
            divergences: Vec::new(),
        }
    }

    fn implicit(name: impl Into<String>) -> Edition {
        Edition {
            name: name.into(),
            divergences: Vec::new(),
        }
    }

    fn explicit(name: impl Into<String>, divergences: Vec<DomainDivergence>) -> Edition {
        Edition {
            name: name.into(),
            divergences,
        }
    }

    fn is_main_timeline(&self) -> bool;
    fn name_or_default(&self) -> &str;
    fn divergence_for(&self, domain: &str) -> Option<i32>;
    fn is_empty(&self) -> bool;
}

impl EditionExt for Edition {
    fn is_main_timeline(&self) -> bool {
        self.name.is_empty()
    }

    fn name_or_default(&self) -> &str {
        if self.name.is_empty() {
            crate::cover::DEFAULT_EDITION
        } else {
            &self.name
        }
    }

    fn divergence_for(&self, domain: &str) -> Option<i32> {
        self.divergences
            .iter()
            .find(|d| d.domain == domain)
            .map(|d| d.sequence)
    }

    fn is_empty(&self) -> bool {
        self.name.is_empty() && self.divergences.is_empty()
    }
}

impl From<&str> for Edition {
    fn from(name: &str) -> Self {
        Edition {
            name: name.to_string(),
            divergences: Vec::new(),
        }
    }
}

impl From<String> for Edition {
    fn from(name: String) -> Self {
        Edition {
            name,
            divergences: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_timeline_is_empty_name() {
        let e = Edition::main_timeline();
        assert!(e.is_main_timeline());
        assert_eq!(e.name_or_default(), crate::cover::DEFAULT_EDITION);
    }

    #[test]
    fn divergence_lookup() {
        let e = Edition::explicit(
            "speculative",
            vec![DomainDivergence {
                domain: "order".into(),
                sequence: 7,
            }],
        );
        assert_eq!(e.divergence_for("order"), Some(7));
        assert_eq!(e.divergence_for("payment"), None);
    }

    #[test]
    fn no_divergence_sentinel() {
        let d = DomainDivergence {
            domain: "order".into(),
            sequence: NO_DIVERGENCE,
        };
        assert_eq!(d.sequence, -1);
    }
}
