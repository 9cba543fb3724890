//! Extension traits over `EventPage`/`CommandPage` for decoding typed
//! payloads and reading merge strategy.

use crate::proto::{event_page, CommandPage, EventPage, MergeStrategy};
use prost::Message;

pub trait EventPageExt {
    fn type_url(&self) -> Option<&str>;
    fn payload(&self) -> Option<&[u8]>;
    fn sequence_num(&self) -> u32;

    /// Decode iff the payload's type-URL ends with `suffix` and the bytes
    /// deserialize; `None` otherwise, never raises (spec §4.1).
    fn decode<M: Message + Default>(&self, suffix: &str) -> Option<M> {
        let type_url = self.type_url()?;
        if !type_url.ends_with(suffix) {
            return None;
        }
        M::decode(self.payload()?).ok()
    }
}

impl EventPageExt for EventPage {
    fn type_url(&self) -> Option<&str> {
        match &self.payload {
            Some(event_page::Payload::Event(any)) => Some(any.type_url.as_str()),
            _ => None,
        }
    }

    fn payload(&self) -> Option<&[u8]> {
        match &self.payload {
            Some(event_page::Payload::Event(any)) => Some(any.value.as_slice()),
            _ => None,
        }
    }

    fn sequence_num(&self) -> u32 {
        self.sequence
    }
}

pub trait CommandPageExt {
    fn type_url(&self) -> Option<&str>;
    fn payload(&self) -> Option<&[u8]>;
    fn sequence_num(&self) -> u32;
    fn merge_strategy(&self) -> MergeStrategy;

    fn decode<M: Message + Default>(&self, suffix: &str) -> Option<M> {
        let type_url = self.type_url()?;
        if !type_url.ends_with(suffix) {
            return None;
        }
        M::decode(self.payload()?).ok()
    }
}

impl CommandPageExt for CommandPage {
    fn type_url(&self) -> Option<&str> {
        self.command.as_ref().map(|a| a.type_url.as_str())
    }

    fn payload(&self) -> Option<&[u8]> {
        self.command.as_ref().map(|a| a.value.as_slice())
    }

    fn sequence_num(&self) -> u32 {
        self.sequence
    }

    /// Unset/invalid strategy defaults to commutative, matching how the
    /// teacher reads an unset oneof/enum field.
    fn merge_strategy(&self) -> MergeStrategy {
        match MergeStrategy::try_from(self.merge_strategy) {
            Ok(MergeStrategy::Strict) => MergeStrategy::Strict,
            _ => MergeStrategy::Commutative,
        }
    }
}
