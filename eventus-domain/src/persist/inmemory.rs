//! 内存版事件存储（InMemoryEventStorage）
//!
//! 以 `SerializedEvent` 形式按（聚合类型, 聚合 ID）分流保存事件，满足
//! `EventStorageProvider` 协议。版本校验与追加在同一把写锁内完成，且两者之间
//! 没有挂起点，因此被取消的提交不会留下部分写入。
//!
//! 典型用途：测试环境、示例与本地开发。
//!
use crate::{
    aggregate::Aggregate,
    domain_event::EventEnvelope,
    entity::Entity,
    error::{DomainError, DomainResult},
    persist::{EventStorageProvider, SerializedEvent, deserialize_events, serialize_events},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

type StreamKey = (String, String);

#[derive(Default)]
pub struct InMemoryEventStorage {
    streams: RwLock<HashMap<StreamKey, Vec<SerializedEvent>>>,
}

impl InMemoryEventStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定聚合已持久化的事件数
    pub async fn stream_len<A: Aggregate>(&self, aggregate_id: &A::Id) -> usize {
        self.streams
            .read()
            .await
            .get(&stream_key::<A>(aggregate_id))
            .map_or(0, Vec::len)
    }

    /// 所有流中的事件总数
    pub async fn event_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }
}

fn stream_key<A: Aggregate>(aggregate_id: &A::Id) -> StreamKey {
    (A::TYPE.to_string(), aggregate_id.to_string())
}

#[async_trait]
impl EventStorageProvider for InMemoryEventStorage {
    async fn get_events<A: Aggregate>(
        &self,
        aggregate_id: &A::Id,
        start: usize,
        count: usize,
    ) -> DomainResult<Vec<EventEnvelope<A::Event>>> {
        // 流内版本从 1 开始连续，版本 v 位于下标 v - 1
        let page: Vec<SerializedEvent> = {
            let streams = self.streams.read().await;
            let Some(stream) = streams.get(&stream_key::<A>(aggregate_id)) else {
                return Ok(Vec::new());
            };
            let from = start.max(1) - 1;
            let to = start.saturating_add(count).saturating_sub(1).min(stream.len());
            stream.get(from..to).map(<[_]>::to_vec).unwrap_or_default()
        };

        deserialize_events::<A::Event>(&page)
    }

    async fn get_last_event<A: Aggregate>(
        &self,
        aggregate_id: &A::Id,
    ) -> DomainResult<Option<EventEnvelope<A::Event>>> {
        let last = self
            .streams
            .read()
            .await
            .get(&stream_key::<A>(aggregate_id))
            .and_then(|stream| stream.last().cloned());

        match last {
            Some(event) => Ok(deserialize_events::<A::Event>(&[event])?.pop()),
            None => Ok(None),
        }
    }

    async fn commit_changes<A: Aggregate>(&self, aggregate: &A) -> DomainResult<()> {
        let pending = aggregate.uncommitted_events();
        if pending.is_empty() {
            return Ok(());
        }

        let expected = aggregate.committed_version();
        if pending[0].version() != expected + 1 {
            return Err(DomainError::invalid_state(format!(
                "uncommitted events start at version {}, expected {}",
                pending[0].version(),
                expected + 1
            )));
        }

        // 序列化在加锁前完成
        let serialized = serialize_events(pending)?;

        let key = stream_key::<A>(aggregate.id());
        let mut streams = self.streams.write().await;
        let actual = streams
            .get(&key)
            .and_then(|stream| stream.last())
            .map_or(0, SerializedEvent::aggregate_version);

        if actual != expected {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_type: A::TYPE.to_string(),
                aggregate_id: aggregate.id().to_string(),
                expected,
                actual,
            });
        }

        streams.entry(key).or_default().extend(serialized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::entity::EventSourced;
    use crate::testing::{Counter, CounterEvent};
    use uuid::Uuid;

    async fn seeded(storage: &InMemoryEventStorage, id: &str, amounts: &[i64]) -> Counter {
        let mut counter = Counter::new(id.to_string());
        for amount in amounts {
            counter
                .raise_event(CounterEvent::Added { amount: *amount }, Uuid::new_v4())
                .unwrap();
        }
        storage.commit_changes(&counter).await.unwrap();
        counter
    }

    #[tokio::test]
    async fn get_events_returns_the_requested_window() {
        let storage = InMemoryEventStorage::new();
        seeded(&storage, "c-1", &[1, 2, 3, 4, 5]).await;
        let id = "c-1".to_string();

        let page = storage.get_events::<Counter>(&id, 2, 2).await.unwrap();
        let versions: Vec<_> = page.iter().map(|e| e.version()).collect();
        assert_eq!(versions, vec![2, 3]);

        let tail = storage.get_events::<Counter>(&id, 4, 10).await.unwrap();
        assert_eq!(tail.len(), 2);

        let past_end = storage.get_events::<Counter>(&id, 6, 10).await.unwrap();
        assert!(past_end.is_empty());

        let from_zero = storage.get_events::<Counter>(&id, 0, 3).await.unwrap();
        let versions: Vec<_> = from_zero.iter().map(|e| e.version()).collect();
        assert_eq!(versions, vec![1, 2]);
        assert!(storage.get_events::<Counter>(&id, 3, 0).await.unwrap().is_empty());
        assert!(storage.get_events::<Counter>(&id, 9, 3).await.unwrap().is_empty());

        let missing = storage
            .get_events::<Counter>(&"nobody".to_string(), 1, 10)
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn get_last_event_reports_current_version() {
        let storage = InMemoryEventStorage::new();
        let id = "c-2".to_string();
        assert!(storage.get_last_event::<Counter>(&id).await.unwrap().is_none());

        seeded(&storage, "c-2", &[7, 8]).await;
        let last = storage.get_last_event::<Counter>(&id).await.unwrap().unwrap();
        assert_eq!(last.version(), 2);
        assert_eq!(last.payload, CounterEvent::Added { amount: 8 });
    }

    #[tokio::test]
    async fn stale_commit_conflicts_and_appends_nothing() {
        let storage = InMemoryEventStorage::new();
        let base = seeded(&storage, "c-3", &[1]).await;

        let mut first = Counter::new("c-3".to_string());
        first
            .load_from_history(base.uncommitted_events().to_vec())
            .unwrap();
        let mut second = first.clone();

        first
            .raise_event(CounterEvent::Added { amount: 1 }, Uuid::new_v4())
            .unwrap();
        storage.commit_changes(&first).await.unwrap();

        second
            .raise_event(CounterEvent::Added { amount: 2 }, Uuid::new_v4())
            .unwrap();
        let err = storage.commit_changes(&second).await.unwrap_err();
        match err {
            DomainError::ConcurrencyConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(storage.stream_len::<Counter>(&"c-3".to_string()).await, 2);
    }

    #[tokio::test]
    async fn streams_are_partitioned_by_aggregate_id() {
        let storage = InMemoryEventStorage::new();
        seeded(&storage, "c-4", &[1, 1]).await;
        seeded(&storage, "c-5", &[1]).await;

        assert_eq!(storage.stream_len::<Counter>(&"c-4".to_string()).await, 2);
        assert_eq!(storage.stream_len::<Counter>(&"c-5".to_string()).await, 1);
        assert_eq!(storage.event_count().await, 3);
    }

    #[tokio::test]
    async fn conflict_on_unknown_stream_creates_nothing() {
        let storage = InMemoryEventStorage::new();

        let mut counter = Counter::new("c-6".to_string());
        counter
            .load_from_history(crate::testing::history("c-6", &[1]))
            .unwrap();
        counter
            .raise_event(CounterEvent::Added { amount: 1 }, Uuid::new_v4())
            .unwrap();

        let err = storage.commit_changes(&counter).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::ConcurrencyConflict {
                expected: 1,
                actual: 0,
                ..
            }
        ));
        assert!(storage.streams.read().await.is_empty());
    }
}
