//! 事件子系统（eventing）
//!
//! 提供读模型侧的事件分发：
//! - `EventHandler`：对已提交事件进行消费处理（更新读模型）；
//! - `EventDispatcher`：按事件种类扇出给订阅的处理器，隔离失败并汇总报告。
//!
//! 该模块不绑定具体传输实现，已提交事件由仓储保存后直接交给分发器。
//!
pub mod dispatcher;
pub mod handler;

pub use dispatcher::{DispatchReport, DispatcherConfig, EventDispatcher, HandlerFailure};
pub use handler::{EventHandler, HandledEventType};
