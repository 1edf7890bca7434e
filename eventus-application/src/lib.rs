//! 事件溯源应用层（eventus-application）
//!
//! 定义命令侧的应用层接口：命令（`Command`）、命令处理器（`CommandHandler`）、
//! 命令总线（`CommandBus`）及其进程内实现（`InMemoryCommandBus`）。
//! 领域层本身不分发命令，命令处理器通常借助 `AggregateRoot` 完成“加载 → 执行 → 保存”。
//!
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod context;
pub mod error;
pub mod inmemory_command_bus;

pub use command::Command;
pub use command_bus::CommandBus;
pub use command_handler::CommandHandler;
pub use context::AppContext;
pub use error::AppError;
pub use inmemory_command_bus::InMemoryCommandBus;
