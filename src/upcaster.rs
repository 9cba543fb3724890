//! UpcasterRouter (spec §4.9): transparent rewriting of persisted events
//! from old type-URLs to current ones during replay.

use crate::proto::{event_page, EventPage};

/// A pure transform from an old payload's bytes to the new payload's
/// bytes plus its type-URL.
pub type Transform = Box<dyn Fn(&[u8]) -> (String, Vec<u8>) + Send + Sync>;

/// Registers `(old_suffix, transform)` pairs. `upcast` never mutates its
/// input; it returns a new, length-preserving sequence where every page
/// matching a registered old suffix is cloned with its event replaced.
pub struct UpcasterRouter {
    transforms: Vec<(String, Transform)>,
}

impl Default for UpcasterRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl UpcasterRouter {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn on(mut self, old_suffix: impl Into<String>, transform: Transform) -> Self {
        self.transforms.push((old_suffix.into(), transform));
        self
    }

    pub fn upcast(&self, pages: &[EventPage]) -> Vec<EventPage> {
        pages
            .iter()
            .map(|page| {
                let Some(event_page::Payload::Event(any)) = &page.payload else {
                    return page.clone();
                };
                let matched = self
                    .transforms
                    .iter()
                    .find(|(suffix, _)| any.type_url.ends_with(suffix.as_str()));
                match matched {
                    Some((_, transform)) => {
                        let (type_url, value) = transform(&any.value);
                        let mut upcasted = page.clone();
                        upcasted.payload = Some(event_page::Payload::Event(prost_types::Any {
                            type_url,
                            value,
                        }));
                        upcasted
                    }
                    None => page.clone(),
                }
            })
            .collect()
    }
}
