use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::hash::Hash;

/// 领域事件载荷需要满足的通用能力边界
///
/// 载荷通常是一个封闭的枚举（每个聚合一个），由 `#[domain_event]` 宏生成实现，
/// 同时生成与之对应的 `Kind` 枚举作为处理器注册表的键。
pub trait DomainEvent:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 事件种类标签（无载荷的判别值）
    type Kind: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// 当前载荷的事件种类
    fn kind(&self) -> Self::Kind;

    /// 事件类型（形如 `AccountEvent.Created` 或自定义类型名），持久化时作为标签
    fn event_type(&self) -> &'static str;

    /// 事件载荷版本（用于版本兼容）
    fn event_version(&self) -> usize;
}

/// 事件种类别名：`EventKind<E>` 即 `E::Kind`
pub type EventKind<E> = <E as DomainEvent>::Kind;
