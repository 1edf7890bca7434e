use crate::{
    command::Command, command_bus::CommandBus, command_handler::CommandHandler,
    context::AppContext, error::AppError,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type CmdHandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>>;

type CmdHandlerFn =
    Arc<dyn for<'a> Fn(Box<dyn Any + Send>, &'a AppContext) -> CmdHandlerFuture<'a> + Send + Sync>;

/// 基于内存的 CommandBus 实现
/// - 通过 TypeId 注册不同 Command 对应的 Handler，每种命令只允许一个处理器
/// - 运行时以类型擦除（Any）方式进行调度
pub struct InMemoryCommandBus {
    handlers: DashMap<TypeId, CmdHandlerFn>,
}

impl Default for InMemoryCommandBus {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}

impl InMemoryCommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器；同一命令重复注册返回 `AlreadyRegisteredCommand`
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let f: CmdHandlerFn = Arc::new(move |boxed_cmd, ctx| {
            let handler = handler.clone();

            Box::pin(async move {
                // 键与闭包同一泛型 C，正常情况下 downcast 不会失败
                match boxed_cmd.downcast::<C>() {
                    Ok(cmd) => handler.handle(ctx, *cmd).await,
                    Err(_) => Err(AppError::TypeMismatch {
                        expected: C::NAME,
                        found: "unknown",
                    }),
                }
            })
        });

        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredCommand { command: C::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(f);
                tracing::debug!(
                    command = C::NAME,
                    handler = type_name::<H>(),
                    "command handler registered"
                );
                Ok(())
            }
        }
    }

    pub fn is_registered<C: Command>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<C>())
    }
}

#[async_trait]
impl CommandBus for InMemoryCommandBus {
    async fn dispatch<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<(), AppError> {
        let Some(f) = self.handlers.get(&TypeId::of::<C>()).map(|h| h.clone()) else {
            return Err(AppError::HandlerNotFound(C::NAME));
        };

        tracing::debug!(
            command = C::NAME,
            aggregate_id = %cmd.aggregate_id(),
            correlation_id = %ctx.correlation_for(&cmd),
            "dispatching command"
        );

        (f)(Box::new(cmd), ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct Ping {
        target: String,
        correlation_id: Uuid,
    }

    impl Command for Ping {
        const NAME: &'static str = "Ping";
        type AggregateId = String;

        fn correlation_id(&self) -> Uuid {
            self.correlation_id
        }

        fn aggregate_id(&self) -> &String {
            &self.target
        }
    }

    struct Pong;

    impl Command for Pong {
        const NAME: &'static str = "Pong";
        type AggregateId = String;

        fn correlation_id(&self) -> Uuid {
            Uuid::nil()
        }

        fn aggregate_id(&self) -> &String {
            static NONE: String = String::new();
            &NONE
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, Uuid)>>,
    }

    #[async_trait]
    impl CommandHandler<Ping> for Recorder {
        async fn handle(&self, ctx: &AppContext, cmd: Ping) -> Result<(), AppError> {
            let correlation = ctx.correlation_for(&cmd);
            self.seen.lock().unwrap().push((cmd.target, correlation));
            Ok(())
        }
    }

    fn ping(target: &str) -> Ping {
        Ping {
            target: target.to_string(),
            correlation_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn routes_to_registered_handler() {
        let bus = InMemoryCommandBus::new();
        let recorder = Arc::new(Recorder::default());
        bus.register::<Ping, _>(recorder.clone()).unwrap();
        assert!(bus.is_registered::<Ping>());
        assert!(!bus.is_registered::<Pong>());

        let cmd = ping("a-1");
        let correlation = cmd.correlation_id;
        bus.dispatch(&AppContext::default(), cmd).await.unwrap();

        let overridden = Uuid::new_v4();
        bus.dispatch(&AppContext::with_correlation_id(overridden), ping("a-2"))
            .await
            .unwrap();

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![("a-1".to_string(), correlation), ("a-2".to_string(), overridden)]
        );
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let bus = InMemoryCommandBus::new();
        bus.register::<Ping, _>(Arc::new(Recorder::default()))
            .unwrap();

        let err = bus
            .register::<Ping, _>(Arc::new(Recorder::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::AlreadyRegisteredCommand { command: "Ping" }
        ));
    }

    #[tokio::test]
    async fn unknown_command_has_no_handler() {
        let bus = InMemoryCommandBus::new();
        let err = bus
            .dispatch(&AppContext::default(), Pong)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HandlerNotFound("Pong")));
        assert!(!err.is_retryable());
    }
}
