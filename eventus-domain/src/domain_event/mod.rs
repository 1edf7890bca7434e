//! 领域事件（Domain Event）
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`），以及将载荷与元数据
//! 封装后的不可变事件 `EventEnvelope`。

mod domain_event_trait;
mod event_envelope;
mod metadata;

pub use domain_event_trait::{DomainEvent, EventKind};
pub use event_envelope::EventEnvelope;
pub use metadata::Metadata;
