//! 聚合根编排器（AggregateRoot）
//!
//! 封装“加载或新建聚合 → 执行业务操作 → 持久化未提交事件 → 分发给读模型”的标准流程，
//! 以仓储实现（`AggregateRepository`）为依赖，便于在应用层直接调用。
//!
//! 读模型分发失败不会使调用失败，只体现在返回的报告中。
//!
use crate::{
    aggregate::Aggregate,
    domain_event::EventEnvelope,
    entity::Entity,
    error::DomainResult,
    eventing::{DispatchReport, EventDispatcher},
    persist::AggregateRepository,
};
use std::marker::PhantomData;
use std::sync::Arc;

/// 一次业务操作的结果
#[derive(Debug)]
pub struct Execution<A>
where
    A: Aggregate,
{
    /// 保存后的聚合（未提交列表已清空）
    pub aggregate: A,
    /// 本次提交的事件
    pub events: Vec<EventEnvelope<A::Event>>,
    /// 每条事件的分发报告，未配置分发器时为空
    pub reports: Vec<DispatchReport>,
}

/// 面向应用层的聚合根编排器。
///
/// - `A`：聚合类型（实现 `Aggregate`）
/// - `R`：聚合仓储（实现 `AggregateRepository<A>`）
pub struct AggregateRoot<A, R>
where
    A: Aggregate,
    R: AggregateRepository<A>,
{
    repo: R,
    dispatcher: Option<Arc<EventDispatcher<A::Event>>>,
    _marker: PhantomData<fn() -> A>,
}

impl<A, R> AggregateRoot<A, R>
where
    A: Aggregate,
    R: AggregateRepository<A>,
{
    /// 创建编排器实例
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            dispatcher: None,
            _marker: PhantomData,
        }
    }

    /// 提交成功后将事件分发给读模型处理器
    pub fn with_dispatcher(mut self, dispatcher: Arc<EventDispatcher<A::Event>>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// 新建聚合并执行业务操作。
    /// 同 ID 聚合已存在时，提交以 `ConcurrencyConflict` 失败。
    pub async fn create<F>(&self, aggregate_id: A::Id, op: F) -> DomainResult<Execution<A>>
    where
        F: FnOnce(&mut A) -> DomainResult<()> + Send,
    {
        let aggregate = <A as Entity>::new(aggregate_id);
        self.run(aggregate, op).await
    }

    /// 加载已有聚合并执行业务操作；聚合不存在时返回 `AggregateNotFound`
    pub async fn update<F>(&self, aggregate_id: &A::Id, op: F) -> DomainResult<Execution<A>>
    where
        F: FnOnce(&mut A) -> DomainResult<()> + Send,
    {
        let aggregate = self.repo.load(aggregate_id).await?;
        self.run(aggregate, op).await
    }

    async fn run<F>(&self, mut aggregate: A, op: F) -> DomainResult<Execution<A>>
    where
        F: FnOnce(&mut A) -> DomainResult<()> + Send,
    {
        op(&mut aggregate)?;

        let events = self.repo.save(&mut aggregate).await?;

        let reports = match &self.dispatcher {
            Some(dispatcher) if !events.is_empty() => dispatcher.publish_all(&events).await,
            _ => Vec::new(),
        };

        tracing::debug!(
            aggregate_type = A::TYPE,
            aggregate_id = %aggregate.id(),
            version = aggregate.version(),
            committed = events.len(),
            "aggregate command executed"
        );

        Ok(Execution {
            aggregate,
            events,
            reports,
        })
    }
}
