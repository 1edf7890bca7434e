//! 事件溯源领域层基础库（eventus-domain）
//!
//! 提供事件溯源运行时的通用抽象与构件：
//! - 聚合（`aggregate`）与实体（`entity`）建模，状态只通过应用事件改变
//! - 领域事件（`domain_event`）与事件信封、元数据
//! - 聚合事件处理器注册表（`handler_registry`），进程级缓存，首次使用时构建
//! - 事件存储协议与基于乐观并发的聚合仓储（`persist`）
//! - 读模型事件分发（`eventing`）与读模型仓储（`read_model`）
//!
//! 本 crate 尽量保持与存储与传输实现解耦，仅定义领域层接口与最小必要的错误类型，
//! 以便在不同基础设施上进行适配实现；内置的内存实现用于测试与示例。
//!
//! 典型用法：
//! 1. 用 `#[domain_event]` 定义事件枚举，用 `#[aggregate]` 定义聚合；
//! 2. 实现 `Aggregate::register_handlers` 声明每种事件的处理函数；
//! 3. 选择 `persist` 中的存储实现并构建 `EventSourcedRepository`；
//! 4. 通过 `AggregateRoot` 编排“加载 → 业务操作 → 保存 → 分发”的完整流程。
//!
pub mod aggregate;
pub mod aggregate_root;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod handler_registry;
pub mod persist;
pub mod read_model;

#[cfg(test)]
mod testing;

// 允许在本 crate 内部通过 ::eventus_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::eventus_domain 路径。
extern crate self as eventus_domain;
