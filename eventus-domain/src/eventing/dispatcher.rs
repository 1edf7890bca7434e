//! 读模型事件分发器（EventDispatcher）
//!
//! 将一条已提交事件扇出给订阅其种类的全部处理器：
//! - 处理器彼此隔离，任一处理器返回错误或 panic 都不会影响其它处理器；
//! - 所有结果汇总为 `DispatchReport`，失败不会转为调用方错误；
//! - 同一事件的处理器并发数受 `DispatcherConfig::handler_concurrency` 限制。
//!
use super::handler::{EventHandler, HandledEventType};
use crate::domain_event::{DomainEvent, EventEnvelope, EventKind};
use crate::error::{DomainError, DomainResult};
use futures_util::{FutureExt, StreamExt, stream};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use uuid::Uuid;

/// 分发器配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// 单事件的处理并发（同一事件广播给多个 handler），小于 1 时按 1 处理
    pub handler_concurrency: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            handler_concurrency: 8,
        }
    }
}

/// 单个处理器的失败记录
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerFailure {
    pub handler: String,
    pub reason: String,
}

/// 单条事件的分发结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub event_id: Uuid,
    pub event_type: String,
    pub succeeded: Vec<String>,
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 将首个失败转换为 `DomainError::EventHandler`
    pub fn into_result(self) -> DomainResult<()> {
        match self.failures.into_iter().next() {
            None => Ok(()),
            Some(failure) => Err(DomainError::EventHandler {
                handler: failure.handler,
                reason: failure.reason,
            }),
        }
    }
}

type SharedHandler<E> = Arc<dyn EventHandler<E>>;

pub struct EventDispatcher<E>
where
    E: DomainEvent,
{
    by_kind: HashMap<EventKind<E>, Vec<SharedHandler<E>>>,
    all: Vec<SharedHandler<E>>,
    config: DispatcherConfig,
}

impl<E> Default for EventDispatcher<E>
where
    E: DomainEvent,
{
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl<E> fmt::Debug for EventDispatcher<E>
where
    E: DomainEvent,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("kinds", &self.by_kind.keys().collect::<Vec<_>>())
            .field("all", &self.all.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<E> EventDispatcher<E>
where
    E: DomainEvent,
{
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            by_kind: HashMap::new(),
            all: Vec::new(),
            config,
        }
    }

    pub fn with_handlers<I>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = SharedHandler<E>>,
    {
        for handler in handlers {
            self.register(handler);
        }
        self
    }

    /// 注册处理器；同名处理器在同一种类下只保留一次
    pub fn register(&mut self, handler: SharedHandler<E>) -> &mut Self {
        match handler.handled_event_type() {
            HandledEventType::All => insert_unique(&mut self.all, handler),
            HandledEventType::One(kind) => {
                insert_unique(self.by_kind.entry(kind).or_default(), handler);
            }
            HandledEventType::Many(kinds) => {
                for kind in kinds {
                    insert_unique(self.by_kind.entry(kind).or_default(), handler.clone());
                }
            }
        }
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// 订阅给定种类的处理器名称（含订阅全部事件的处理器）
    pub fn handler_names(&self, kind: EventKind<E>) -> Vec<String> {
        self.matching(kind)
            .iter()
            .map(|h| h.handler_name().to_string())
            .collect()
    }

    fn matching(&self, kind: EventKind<E>) -> Vec<SharedHandler<E>> {
        let mut seen = HashSet::new();
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .chain(self.all.iter())
            .filter(|h| seen.insert(h.handler_name().to_string()))
            .cloned()
            .collect()
    }

    /// 将事件分发给所有匹配的处理器
    pub async fn publish(&self, event: &EventEnvelope<E>) -> DispatchReport {
        let handlers = self.matching(event.kind());
        let concurrency = self.config.handler_concurrency.max(1);

        // 由具名 async fn 构造每个处理器的 future，publish 的 future 才满足 Send
        let runs: Vec<_> = handlers
            .into_iter()
            .map(|handler| run_handler(handler, event))
            .collect();
        let outcomes: Vec<(String, Result<(), String>)> =
            stream::iter(runs).buffered(concurrency).collect().await;

        let mut report = DispatchReport {
            event_id: event.event_id(),
            event_type: event.event_type().to_string(),
            succeeded: Vec::new(),
            failures: Vec::new(),
        };

        for (handler, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(handler),
                Err(reason) => {
                    tracing::warn!(
                        handler = %handler,
                        event_type = %report.event_type,
                        event_id = %report.event_id,
                        aggregate_id = %event.aggregate_id(),
                        version = event.version(),
                        reason = %reason,
                        "event handler failed"
                    );
                    report.failures.push(HandlerFailure { handler, reason });
                }
            }
        }

        report
    }

    /// 按顺序分发一批已提交事件
    pub async fn publish_all(&self, events: &[EventEnvelope<E>]) -> Vec<DispatchReport> {
        let mut reports = Vec::with_capacity(events.len());
        for event in events {
            reports.push(self.publish(event).await);
        }
        reports
    }
}

async fn run_handler<E>(
    handler: SharedHandler<E>,
    event: &EventEnvelope<E>,
) -> (String, Result<(), String>)
where
    E: DomainEvent,
{
    let name = handler.handler_name().to_string();
    let outcome = match AssertUnwindSafe(handler.handle(event))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(panic) => Err(panic_reason(&*panic)),
    };
    (name, outcome)
}

fn insert_unique<E>(list: &mut Vec<SharedHandler<E>>, handler: SharedHandler<E>)
where
    E: DomainEvent,
{
    if list
        .iter()
        .any(|h| h.handler_name() == handler.handler_name())
    {
        return;
    }
    list.push(handler);
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
