use super::domain_event_trait::DomainEvent;
use super::metadata::Metadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 事件信封：一条不可变的事实，包含元数据与事件载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    pub metadata: Metadata,
    pub payload: E,
}

impl<E> EventEnvelope<E>
where
    E: DomainEvent,
{
    pub fn new(metadata: Metadata, payload: E) -> Self {
        Self { metadata, payload }
    }

    pub fn kind(&self) -> E::Kind {
        self.payload.kind()
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    pub fn event_id(&self) -> Uuid {
        self.metadata.event_id()
    }

    pub fn aggregate_id(&self) -> &str {
        self.metadata.aggregate_id()
    }

    pub fn version(&self) -> usize {
        self.metadata.aggregate_version()
    }
}
