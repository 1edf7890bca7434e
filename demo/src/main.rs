use demo::account::Account;
use demo::commands::{AccountCommandHandler, CreateAccount, DepositFunds, WithdrawFunds};
use demo::projections::{TopAccountsReadModel, account_projections};
use eventus_application::{AppContext, CommandBus, InMemoryCommandBus};
use eventus_domain::aggregate_root::AggregateRoot;
use eventus_domain::entity::Entity;
use eventus_domain::eventing::{DispatcherConfig, EventDispatcher};
use eventus_domain::persist::{
    AggregateRepository, EventSourcedRepository, InMemoryEventStorage, RepositoryConfig,
};
use eventus_domain::read_model::{InMemoryReadModelRepository, ReadModelRepository};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // EVENTUS_PAGE_SIZE 控制加载聚合时的分页大小
    let config = match std::env::var("EVENTUS_PAGE_SIZE") {
        Ok(raw) => RepositoryConfig::with_page_size(raw.parse()?),
        Err(_) => RepositoryConfig::default(),
    };

    let storage = Arc::new(InMemoryEventStorage::new());
    let repository = EventSourcedRepository::builder()
        .storage(storage.clone())
        .config(config)
        .build();

    let read_model = Arc::new(InMemoryReadModelRepository::<TopAccountsReadModel>::new());
    let dispatcher = EventDispatcher::new(DispatcherConfig::default())
        .with_handlers(account_projections(read_model.clone()));

    let root = AggregateRoot::<Account, _>::new(repository).with_dispatcher(Arc::new(dispatcher));
    let handler = Arc::new(AccountCommandHandler::new(root));

    let bus = InMemoryCommandBus::new();
    bus.register::<CreateAccount, _>(handler.clone())?;
    bus.register::<DepositFunds, _>(handler.clone())?;
    bus.register::<WithdrawFunds, _>(handler.clone())?;

    let account_id = Uuid::new_v4();
    let ctx = AppContext::with_correlation_id(Uuid::new_v4());

    bus.dispatch(
        &ctx,
        CreateAccount {
            correlation_id: Uuid::new_v4(),
            account_id,
            name: "alice".to_string(),
        },
    )
    .await?;
    bus.dispatch(
        &ctx,
        DepositFunds {
            correlation_id: Uuid::new_v4(),
            account_id,
            amount: 120,
        },
    )
    .await?;
    bus.dispatch(
        &ctx,
        WithdrawFunds {
            correlation_id: Uuid::new_v4(),
            account_id,
            amount: 50,
        },
    )
    .await?;

    let account: Account =
        AggregateRepository::<Account>::load(handler.root().repository(), &account_id).await?;
    let stored_events = storage.event_count().await;
    tracing::info!(
        account_id = %account_id,
        name = account.name(),
        balance = account.balance(),
        version = account.version(),
        stored_events,
        "account loaded from history"
    );

    let summary = read_model.get().await?.unwrap_or_default();
    for entry in summary.top(10) {
        tracing::info!(account_id = %entry.id, balance = entry.balance, "read model");
    }

    Ok(())
}
