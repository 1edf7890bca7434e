//! 事件处理器（EventHandler）
//!
//! 定义消费某类/多类/全部已提交事件的读模型处理逻辑与元信息（名称、订阅类型）。
//!
use crate::domain_event::{DomainEvent, EventEnvelope, EventKind};
use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandledEventType<K> {
    One(K),
    Many(Vec<K>),
    All,
}

/// 事件处理器：处理某一聚合事件类型的已提交事件
#[async_trait]
pub trait EventHandler<E>: Send + Sync
where
    E: DomainEvent,
{
    /// 处理器名称（用于去重与失败报告）
    fn handler_name(&self) -> &str;
    /// 返回该处理器订阅的事件种类
    fn handled_event_type(&self) -> HandledEventType<EventKind<E>>;
    /// 处理事件
    async fn handle(&self, event: &EventEnvelope<E>) -> anyhow::Result<()>;
}
