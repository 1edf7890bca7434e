//! 持久化与事件溯源（persist）
//!
//! 定义事件存储协议与基于它的通用聚合仓储：
//! - 事件存储提供者（`EventStorageProvider`）及内存实现（`InMemoryEventStorage`）；
//! - 事件的存储形态与批量转换（`SerializedEvent`、`serialize_events`、`deserialize_events`）；
//! - 分页加载、乐观并发提交的聚合仓储（`EventSourcedRepository`）。
//!
//! 该模块聚焦协议与装配逻辑，具体存储后端由上层提供实现并注入。
//!
mod aggregate_repository;
mod event_storage;
mod inmemory;
mod serialized_event;

pub use aggregate_repository::{AggregateRepository, EventSourcedRepository, RepositoryConfig};
pub use event_storage::EventStorageProvider;
pub use inmemory::InMemoryEventStorage;
pub use serialized_event::{SerializedEvent, deserialize_events, serialize_events};
