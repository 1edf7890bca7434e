//! 事件持久化模型（SerializedEvent）
//!
//! 定义事件在存储层的标准形态与在 `EventEnvelope` 间的转换，
//! 并提供批量序列化/反序列化的工具函数。
//!
use crate::{
    domain_event::{DomainEvent, EventEnvelope, Metadata},
    error::{DomainError, DomainResult},
};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// 事件唯一标识符
    event_id: String,
    /// 事件类型，用于区分不同的事件
    event_type: String,
    /// 事件载荷版本
    event_version: usize,
    /// 聚合 ID，标识事件所属的聚合根实例
    aggregate_id: String,
    /// 聚合类型，用于区分不同的聚合根
    aggregate_type: String,
    /// 聚合版本，用于乐观锁和并发控制
    aggregate_version: usize,
    /// 关联 ID，用于将多个事件关联到同一个业务操作
    correlation_id: String,
    /// 事件发生时间
    occurred_at: DateTime<Utc>,
    /// 事件负载，存储事件的具体数据
    payload: Value,
}

impl SerializedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> usize {
        self.event_version
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_version(&self) -> usize {
        self.aggregate_version
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl<E> TryFrom<&EventEnvelope<E>> for SerializedEvent
where
    E: DomainEvent,
{
    type Error = serde_json::Error;

    fn try_from(envelope: &EventEnvelope<E>) -> Result<Self, Self::Error> {
        Ok(SerializedEvent {
            event_id: envelope.metadata.event_id().to_string(),
            event_type: envelope.payload.event_type().to_string(),
            event_version: envelope.payload.event_version(),
            aggregate_id: envelope.metadata.aggregate_id().to_string(),
            aggregate_type: envelope.metadata.aggregate_type().to_string(),
            aggregate_version: envelope.metadata.aggregate_version(),
            correlation_id: envelope.metadata.correlation_id().to_string(),
            occurred_at: *envelope.metadata.occurred_at(),
            payload: serde_json::to_value(&envelope.payload)?,
        })
    }
}

impl<E> TryFrom<&SerializedEvent> for EventEnvelope<E>
where
    E: DomainEvent,
{
    type Error = DomainError;

    fn try_from(value: &SerializedEvent) -> Result<Self, Self::Error> {
        let payload: E = serde_json::from_value(value.payload.clone())?;

        // 存储的类型标签必须与解码出的载荷一致，否则视为历史损坏
        if payload.event_type() != value.event_type {
            return Err(DomainError::TypeMismatch {
                expected: value.event_type.clone(),
                found: payload.event_type().to_string(),
            });
        }

        let metadata = Metadata::builder()
            .event_id(value.event_id.parse::<Uuid>()?)
            .aggregate_id(value.aggregate_id.clone())
            .aggregate_type(value.aggregate_type.clone())
            .aggregate_version(value.aggregate_version)
            .correlation_id(value.correlation_id.parse::<Uuid>()?)
            .occurred_at(value.occurred_at)
            .build();

        Ok(EventEnvelope::new(metadata, payload))
    }
}

pub fn serialize_events<E>(events: &[EventEnvelope<E>]) -> DomainResult<Vec<SerializedEvent>>
where
    E: DomainEvent,
{
    let events = events
        .iter()
        .map(SerializedEvent::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

pub fn deserialize_events<E>(events: &[SerializedEvent]) -> DomainResult<Vec<EventEnvelope<E>>>
where
    E: DomainEvent,
{
    events.iter().map(EventEnvelope::<E>::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CounterEvent, history};

    #[test]
    fn envelope_survives_serialization() {
        let original = history("c-1", &[3, -2]);
        let stored = serialize_events(&original).unwrap();

        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].event_type(), "CounterEvent.Added");
        assert_eq!(stored[1].event_type(), "CounterEvent.Subtracted");
        assert_eq!(stored[1].aggregate_version(), 2);
        assert_eq!(stored[1].aggregate_type(), "counter");
        assert_eq!(stored[0].event_version(), 1);

        let restored = deserialize_events::<CounterEvent>(&stored).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn tampered_type_tag_is_rejected() {
        let original = history("c-2", &[3]);
        let stored = serialize_events(&original).unwrap();

        let tampered = SerializedEvent::builder()
            .event_id(stored[0].event_id().to_string())
            .event_type("CounterEvent.Subtracted".to_string())
            .event_version(1)
            .aggregate_id("c-2".to_string())
            .aggregate_type("counter".to_string())
            .aggregate_version(1)
            .correlation_id(stored[0].correlation_id().to_string())
            .occurred_at(stored[0].occurred_at())
            .payload(stored[0].payload().clone())
            .build();

        let err = deserialize_events::<CounterEvent>(&[tampered]).unwrap_err();
        assert!(matches!(err, DomainError::TypeMismatch { .. }));
    }
}
