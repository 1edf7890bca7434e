//! 聚合仓储
//!
//! 基于 `EventStorageProvider` 的通用事件溯源仓储：
//! - `load` 从版本 1 开始分页读取历史并重放，没有历史时返回 `AggregateNotFound`；
//! - `save` 以 `committed_version` 为期望版本提交未提交事件，成功后清空未提交列表，
//!   冲突时聚合保持原样，由调用方决定是否重新加载后重试。
//!
use crate::{
    aggregate::Aggregate,
    domain_event::EventEnvelope,
    entity::{Entity, EventSourced},
    error::{DomainError, DomainResult},
    persist::EventStorageProvider,
};
use async_trait::async_trait;
use bon::Builder;
use std::sync::Arc;

#[async_trait]
pub trait AggregateRepository<A>: Send + Sync
where
    A: Aggregate,
{
    async fn load(&self, aggregate_id: &A::Id) -> DomainResult<A>;

    /// 提交聚合的未提交事件，返回本次写入的事件
    async fn save(&self, aggregate: &mut A) -> DomainResult<Vec<EventEnvelope<A::Event>>>;
}

#[async_trait]
impl<A, T> AggregateRepository<A> for Arc<T>
where
    A: Aggregate,
    T: AggregateRepository<A> + ?Sized,
{
    async fn load(&self, aggregate_id: &A::Id) -> DomainResult<A> {
        (**self).load(aggregate_id).await
    }

    async fn save(&self, aggregate: &mut A) -> DomainResult<Vec<EventEnvelope<A::Event>>> {
        (**self).save(aggregate).await
    }
}

/// 仓储配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// 加载时每页读取的事件数，小于 1 时按 1 处理
    pub page_size: usize,
}

impl RepositoryConfig {
    pub const DEFAULT_PAGE_SIZE: usize = 100;

    pub fn with_page_size(page_size: usize) -> Self {
        Self { page_size }
    }

    fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// 基于事件存储的通用聚合仓储实现
#[derive(Builder)]
pub struct EventSourcedRepository<S> {
    storage: Arc<S>,
    #[builder(default)]
    config: RepositoryConfig,
}

impl<S> EventSourcedRepository<S>
where
    S: EventStorageProvider,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            config: RepositoryConfig::default(),
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// 存储中的当前版本，不存在时为 0
    pub async fn current_version<A: Aggregate>(&self, aggregate_id: &A::Id) -> DomainResult<usize> {
        let last = self.storage.get_last_event::<A>(aggregate_id).await?;
        Ok(last.map_or(0, |event| event.version()))
    }

    pub async fn exists<A: Aggregate>(&self, aggregate_id: &A::Id) -> DomainResult<bool> {
        Ok(self.current_version::<A>(aggregate_id).await? > 0)
    }
}

#[async_trait]
impl<A, S> AggregateRepository<A> for EventSourcedRepository<S>
where
    A: Aggregate,
    S: EventStorageProvider,
{
    async fn load(&self, aggregate_id: &A::Id) -> DomainResult<A> {
        let page_size = self.config.effective_page_size();
        let mut aggregate = A::new(aggregate_id.clone());
        let mut start = 1;

        loop {
            let page = self
                .storage
                .get_events::<A>(aggregate_id, start, page_size)
                .await?;
            let fetched = page.len();

            aggregate.load_from_history(page)?;

            if fetched < page_size {
                break;
            }
            start += fetched;
        }

        if aggregate.version() == 0 {
            return Err(DomainError::AggregateNotFound {
                aggregate_type: A::TYPE.to_string(),
                aggregate_id: aggregate_id.to_string(),
            });
        }

        tracing::debug!(
            aggregate_type = A::TYPE,
            aggregate_id = %aggregate_id,
            version = aggregate.version(),
            "aggregate loaded"
        );

        Ok(aggregate)
    }

    async fn save(&self, aggregate: &mut A) -> DomainResult<Vec<EventEnvelope<A::Event>>> {
        if aggregate.uncommitted_events().is_empty() {
            return Ok(Vec::new());
        }

        let expected = aggregate.committed_version();

        if let Err(err) = self.storage.commit_changes::<A>(aggregate).await {
            if matches!(err, DomainError::ConcurrencyConflict { .. }) {
                tracing::warn!(
                    aggregate_type = A::TYPE,
                    aggregate_id = %aggregate.id(),
                    expected_version = expected,
                    error = %err,
                    "commit rejected"
                );
            }
            return Err(err);
        }

        let committed = std::mem::take(aggregate.uncommitted_events_mut());

        tracing::debug!(
            aggregate_type = A::TYPE,
            aggregate_id = %aggregate.id(),
            from_version = expected,
            to_version = aggregate.version(),
            "aggregate saved"
        );

        Ok(committed)
    }
}
