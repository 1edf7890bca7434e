//! 实体（Entity）基础抽象
//!
//! 为聚合提供统一的标识（Id）与版本能力，并约定事件溯源所需的
//! 未提交事件缓冲区。两者通常由 `#[aggregate]` 宏生成。
//!
use crate::domain_event::{DomainEvent, EventEnvelope};
use std::fmt::Display;

/// 具备唯一标识与版本的实体抽象
pub trait Entity: Send + Sync {
    /// 实体标识类型，要求可显示与可克隆
    type Id: Clone + Display + Send + Sync + 'static;

    /// 使用给定标识创建实体（版本为 0，尚未创建）
    fn new(aggregate_id: Self::Id) -> Self;

    /// 获取实体标识
    fn id(&self) -> &Self::Id;

    /// 获取当前版本（已应用事件的最高版本）
    fn version(&self) -> usize;
}

/// 事件溯源实体：持有版本写入口与未提交事件
///
/// 这些方法供运行时（`Aggregate::apply_event`、仓储）使用，业务代码不应直接调用。
pub trait EventSourced: Entity {
    /// 该实体产生的领域事件类型
    type Event: DomainEvent;

    fn set_version(&mut self, version: usize);

    fn uncommitted_events(&self) -> &[EventEnvelope<Self::Event>];

    fn uncommitted_events_mut(&mut self) -> &mut Vec<EventEnvelope<Self::Event>>;
}
