//! 事件溯源过程宏（eventus-macros）
//!
//! - `#[aggregate]`：为聚合结构体注入标识、版本与未提交事件字段，并实现
//!   `Entity` / `EventSourced`
//! - `#[domain_event]`：为事件枚举生成种类枚举 `{Enum}Kind` 与 `DomainEvent` 实现
//!
mod aggregate;
mod domain_event;
mod utils;

use proc_macro::TokenStream;

/// 聚合宏
///
/// `#[aggregate(id = IdType, event = EventType, debug = true|false)]`
#[proc_macro_attribute]
pub fn aggregate(attr: TokenStream, item: TokenStream) -> TokenStream {
    aggregate::expand(attr, item)
}

/// 领域事件宏
///
/// `#[domain_event(version = N)]`，变体可用 `#[event(event_type = "...", event_version = N)]` 覆写
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}
