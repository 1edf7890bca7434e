//! 事件存储提供者协议（EventStorageProvider）
//!
//! 以（聚合类型, 聚合 ID）为键的只追加存储。具体后端（关系库、日志存储、内存）
//! 由外部实现，需满足：
//! - `get_events` 返回版本在 `[start, start + count)` 内的事件，按版本升序，不存在时为空；
//! - `get_last_event` 返回最新事件，用于在不分页读取全部历史的情况下得到当前版本；
//! - `commit_changes` 原子地追加聚合的未提交事件，仅当存储中的版本仍等于聚合的
//!   期望版本（`committed_version`）时成功，否则返回 `ConcurrencyConflict`。
//!   被取消的提交不得留下部分追加。
//!
use crate::{aggregate::Aggregate, domain_event::EventEnvelope, error::DomainResult};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait EventStorageProvider: Send + Sync {
    async fn get_events<A: Aggregate>(
        &self,
        aggregate_id: &A::Id,
        start: usize,
        count: usize,
    ) -> DomainResult<Vec<EventEnvelope<A::Event>>>;

    async fn get_last_event<A: Aggregate>(
        &self,
        aggregate_id: &A::Id,
    ) -> DomainResult<Option<EventEnvelope<A::Event>>>;

    async fn commit_changes<A: Aggregate>(&self, aggregate: &A) -> DomainResult<()>;
}

#[async_trait]
impl<T> EventStorageProvider for Arc<T>
where
    T: EventStorageProvider + ?Sized,
{
    async fn get_events<A: Aggregate>(
        &self,
        aggregate_id: &A::Id,
        start: usize,
        count: usize,
    ) -> DomainResult<Vec<EventEnvelope<A::Event>>> {
        (**self).get_events::<A>(aggregate_id, start, count).await
    }

    async fn get_last_event<A: Aggregate>(
        &self,
        aggregate_id: &A::Id,
    ) -> DomainResult<Option<EventEnvelope<A::Event>>> {
        (**self).get_last_event::<A>(aggregate_id).await
    }

    async fn commit_changes<A: Aggregate>(&self, aggregate: &A) -> DomainResult<()> {
        (**self).commit_changes::<A>(aggregate).await
    }
}
