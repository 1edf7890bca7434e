//! 聚合（Aggregate）抽象
//!
//! 聚合只通过应用事件改变状态：
//! - `raise_event` 由业务方法调用，记录一条新事实并立即应用（进入未提交列表）；
//! - `load_from_history` 按版本升序重放历史事件（不进入未提交列表）；
//! - `apply_event` 通过处理器注册表找到唯一的处理函数并推进版本。
//!
use crate::domain_event::{DomainEvent, EventEnvelope, Metadata};
use crate::entity::{Entity, EventSourced};
use crate::error::{DomainError, DomainResult};
use crate::handler_registry::{HandlerRegistry, HandlerTable};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// 事件应用模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// 业务操作新产生的事件，应用后进入未提交列表
    New,
    /// 重放的历史事件
    Replay,
}

/// 聚合根接口
pub trait Aggregate: EventSourced + Send + Sync + Sized + 'static {
    /// 聚合类型标签，作为存储分区键的一部分
    const TYPE: &'static str;

    /// 声明该聚合的事件处理表，每种事件至多一个处理函数
    fn register_handlers(handlers: &mut HandlerTable<Self>) -> DomainResult<()>;

    /// 获取（首次构建并缓存）该聚合类型的处理器表
    fn handlers() -> DomainResult<Arc<HandlerTable<Self>>> {
        HandlerRegistry::resolve::<Self>()
    }

    /// 已持久化的版本（不含未提交事件），即提交时的期望版本
    fn committed_version(&self) -> usize {
        self.version()
            .saturating_sub(self.uncommitted_events().len())
    }

    /// 应用单个事件；失败时聚合保持不变
    fn apply_event(
        &mut self,
        event: EventEnvelope<Self::Event>,
        mode: ApplyMode,
    ) -> DomainResult<()> {
        let handlers = Self::handlers()?;
        check_target(self, &event, self.version() + 1)?;

        let handler = handlers
            .get(event.kind())
            .ok_or_else(|| DomainError::UnhandledEvent {
                aggregate_type: Self::TYPE.to_string(),
                event_type: event.event_type().to_string(),
            })?;

        handler(self, &event.payload);
        self.set_version(event.version());

        if mode == ApplyMode::New {
            self.uncommitted_events_mut().push(event);
        }

        Ok(())
    }

    /// 记录一条新事实：版本为当前版本 + 1，应用后进入未提交列表
    fn raise_event(&mut self, payload: Self::Event, correlation_id: Uuid) -> DomainResult<()> {
        let metadata = Metadata::builder()
            .event_id(Uuid::new_v4())
            .aggregate_id(self.id().to_string())
            .aggregate_type(Self::TYPE.to_string())
            .aggregate_version(self.version() + 1)
            .correlation_id(correlation_id)
            .occurred_at(Utc::now())
            .build();

        self.apply_event(EventEnvelope::new(metadata, payload), ApplyMode::New)
    }

    /// 按版本升序重放历史事件。
    ///
    /// 整批事件先校验（连续性、归属、处理器存在）再应用，
    /// 任一事件不合法时聚合保持在调用前的版本。
    fn load_from_history<I>(&mut self, events: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = EventEnvelope<Self::Event>>,
    {
        let events: Vec<_> = events.into_iter().collect();
        let handlers = Self::handlers()?;

        let mut expected = self.version() + 1;
        for event in &events {
            check_target(self, event, expected)?;
            if !handlers.contains(event.kind()) {
                return Err(DomainError::UnhandledEvent {
                    aggregate_type: Self::TYPE.to_string(),
                    event_type: event.event_type().to_string(),
                });
            }
            expected += 1;
        }

        for event in events {
            self.apply_event(event, ApplyMode::Replay)?;
        }

        Ok(())
    }
}

// 校验事件归属与序号
fn check_target<A>(
    aggregate: &A,
    event: &EventEnvelope<A::Event>,
    expected: usize,
) -> DomainResult<()>
where
    A: Aggregate,
{
    if event.metadata.aggregate_type() != A::TYPE {
        return Err(DomainError::TypeMismatch {
            expected: A::TYPE.to_string(),
            found: event.metadata.aggregate_type().to_string(),
        });
    }

    let id = aggregate.id().to_string();
    if event.aggregate_id() != id {
        return Err(DomainError::AggregateMismatch {
            expected: id,
            found: event.aggregate_id().to_string(),
        });
    }

    if event.version() != expected {
        return Err(DomainError::OutOfSequence {
            aggregate_type: A::TYPE.to_string(),
            aggregate_id: id,
            expected,
            found: event.version(),
        });
    }

    Ok(())
}
