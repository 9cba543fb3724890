//! Fluent builders for commands and queries, stopping at a typed value
//! the wire surface of spec §6 consumes — no transport call is made here.

use crate::convert::{parse_timestamp, uuid_to_proto};
use crate::error::{DispatchError, DispatchResult};
use crate::proto::{
    query::Selection, temporal_query::PointInTime, CommandBook, CommandPage, Cover, Edition,
    MergeStrategy, Query, SequenceRange, TemporalQuery,
};
use prost::Message;
use uuid::Uuid;

pub struct CommandBuilder {
    domain: String,
    root: Option<Uuid>,
    correlation_id: Option<String>,
    sequence: u32,
    merge_strategy: MergeStrategy,
    type_url: Option<String>,
    payload: Option<Vec<u8>>,
}

impl CommandBuilder {
    pub fn new(domain: impl Into<String>, root: Option<Uuid>) -> Self {
        Self {
            domain: domain.into(),
            root,
            correlation_id: None,
            sequence: 0,
            merge_strategy: MergeStrategy::Commutative,
            type_url: None,
            payload: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_sequence(mut self, seq: u32) -> Self {
        self.sequence = seq;
        self
    }

    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn with_command<M: Message>(mut self, type_url: impl Into<String>, message: &M) -> Self {
        self.type_url = Some(type_url.into());
        self.payload = Some(message.encode_to_vec());
        self
    }

    pub fn build(self) -> DispatchResult<CommandBook> {
        let type_url = self
            .type_url
            .ok_or_else(|| DispatchError::InvalidArgument("command type_url not set".into()))?;
        let payload = self
            .payload
            .ok_or_else(|| DispatchError::InvalidArgument("command payload not set".into()))?;
        let correlation_id = self
            .correlation_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(CommandBook {
            cover: Some(Cover {
                domain: self.domain,
                root: self.root.map(uuid_to_proto),
                correlation_id,
                edition: None,
            }),
            pages: vec![CommandPage {
                sequence: self.sequence,
                merge_strategy: self.merge_strategy as i32,
                command: Some(prost_types::Any {
                    type_url,
                    value: payload,
                }),
            }],
            saga_origin: None,
        })
    }
}

pub struct QueryBuilder {
    domain: String,
    root: Option<Uuid>,
    correlation_id: Option<String>,
    selection: Option<Selection>,
    edition: Option<String>,
}

impl QueryBuilder {
    pub fn new(domain: impl Into<String>, root: Option<Uuid>) -> Self {
        Self {
            domain: domain.into(),
            root,
            correlation_id: None,
            selection: None,
            edition: None,
        }
    }

    pub fn by_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self.root = None;
        self
    }

    pub fn edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = Some(edition.into());
        self
    }

    pub fn range(mut self, lower: u32) -> Self {
        self.selection = Some(Selection::Range(SequenceRange { lower, upper: None }));
        self
    }

    pub fn range_to(mut self, lower: u32, upper: u32) -> Self {
        self.selection = Some(Selection::Range(SequenceRange {
            lower,
            upper: Some(upper),
        }));
        self
    }

    pub fn as_of_sequence(mut self, seq: u32) -> Self {
        self.selection = Some(Selection::Temporal(TemporalQuery {
            point_in_time: Some(PointInTime::AsOfSequence(seq)),
        }));
        self
    }

    pub fn as_of_time(mut self, rfc3339: &str) -> DispatchResult<Self> {
        let timestamp = parse_timestamp(rfc3339)?;
        self.selection = Some(Selection::Temporal(TemporalQuery {
            point_in_time: Some(PointInTime::AsOfTime(timestamp)),
        }));
        Ok(self)
    }

    pub fn build(self) -> Query {
        Query {
            cover: Some(Cover {
                domain: self.domain,
                root: self.root.map(uuid_to_proto),
                correlation_id: self.correlation_id.unwrap_or_default(),
                edition: self.edition.map(Edition::from),
            }),
            selection: self.selection,
        }
    }
}
