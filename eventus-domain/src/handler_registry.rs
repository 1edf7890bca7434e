//! 聚合事件处理器注册表（HandlerRegistry）
//!
//! 每个聚合类型通过 `Aggregate::register_handlers` 显式声明“事件种类 → 处理函数”表，
//! 同一事件种类只能注册一个处理函数，重复注册在构建时即失败。
//! 构建结果按聚合类型缓存于进程级表中，所有实例共享，首次填充的并发竞争
//! 由 `DashMap` 的 entry 锁串行化：只会有一份表被构建并写入。
//!
use crate::aggregate::Aggregate;
use crate::domain_event::EventKind;
use crate::entity::EventSourced;
use crate::error::{DomainError, DomainResult};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as DashEntry;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// 聚合的事件处理函数：纯状态迁移，不做 I/O，不读时钟
pub type EventHandlerFn<A> = fn(&mut A, &<A as EventSourced>::Event);

/// 单个聚合类型的“事件种类 → 处理函数”表
pub struct HandlerTable<A>
where
    A: Aggregate,
{
    handlers: HashMap<EventKind<A::Event>, EventHandlerFn<A>>,
}

impl<A> HandlerTable<A>
where
    A: Aggregate,
{
    fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// 为事件种类注册处理函数；同一种类重复注册返回 `DuplicateHandler`
    pub fn on(
        &mut self,
        kind: EventKind<A::Event>,
        handler: EventHandlerFn<A>,
    ) -> DomainResult<&mut Self> {
        match self.handlers.entry(kind) {
            Entry::Occupied(_) => Err(DomainError::DuplicateHandler {
                aggregate_type: A::TYPE.to_string(),
                event_type: kind.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(self)
            }
        }
    }

    pub fn get(&self, kind: EventKind<A::Event>) -> Option<EventHandlerFn<A>> {
        self.handlers.get(&kind).copied()
    }

    pub fn contains(&self, kind: EventKind<A::Event>) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EventKind<A::Event>> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<A> fmt::Debug for HandlerTable<A>
where
    A: Aggregate,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("aggregate_type", &A::TYPE)
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

type CachedTable = Arc<dyn Any + Send + Sync>;

static HANDLER_CACHE: LazyLock<DashMap<TypeId, CachedTable>> = LazyLock::new(DashMap::new);

/// 进程级处理器表缓存入口
pub struct HandlerRegistry;

impl HandlerRegistry {
    /// 获取聚合类型的处理器表，首次调用时构建并缓存。
    ///
    /// 构建在缓存锁之外进行，仅插入时持锁；并发首次填充时可能各自构建，
    /// 但只有最先写入的表被保留并返回给所有调用方。
    /// 构建失败（如重复注册）不会写入缓存，后续调用会再次得到同样的错误。
    pub fn resolve<A>() -> DomainResult<Arc<HandlerTable<A>>>
    where
        A: Aggregate,
    {
        let key = TypeId::of::<A>();

        let cached = HANDLER_CACHE
            .get(&key)
            .map(|entry| Arc::clone(entry.value()));

        let erased = match cached {
            Some(erased) => erased,
            None => {
                let built: CachedTable = Arc::new(Self::build::<A>()?);
                match HANDLER_CACHE.entry(key) {
                    DashEntry::Occupied(entry) => Arc::clone(entry.get()),
                    DashEntry::Vacant(slot) => {
                        slot.insert(Arc::clone(&built));
                        tracing::debug!(aggregate_type = A::TYPE, "event handler table registered");
                        built
                    }
                }
            }
        };

        erased
            .downcast::<HandlerTable<A>>()
            .map_err(|_| DomainError::Registration {
                aggregate_type: A::TYPE.to_string(),
                reason: format!("cached entry is not a handler table for {}", type_name::<A>()),
            })
    }

    /// 该聚合类型的处理器表是否已缓存
    pub fn is_registered<A>() -> bool
    where
        A: Aggregate,
    {
        HANDLER_CACHE.contains_key(&TypeId::of::<A>())
    }

    fn build<A>() -> DomainResult<HandlerTable<A>>
    where
        A: Aggregate,
    {
        let mut table = HandlerTable::new();
        A::register_handlers(&mut table)?;
        Ok(table)
    }

    #[cfg(test)]
    fn corrupt<A: 'static>() {
        HANDLER_CACHE.insert(TypeId::of::<A>(), Arc::new(()));
    }
}
