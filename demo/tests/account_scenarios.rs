use chrono::Utc;
use demo::account::{Account, AccountEvent};
use demo::commands::{AccountCommandHandler, CreateAccount, DepositFunds, WithdrawFunds};
use demo::projections::{AccountSummary, TopAccountsReadModel, account_projections};
use eventus_application::{AppContext, AppError, CommandBus, InMemoryCommandBus};
use eventus_domain::aggregate_root::AggregateRoot;
use eventus_domain::domain_event::{EventEnvelope, Metadata};
use eventus_domain::entity::{Entity, EventSourced};
use eventus_domain::error::DomainError;
use eventus_domain::eventing::EventDispatcher;
use eventus_domain::persist::{AggregateRepository, EventSourcedRepository, InMemoryEventStorage};
use eventus_domain::read_model::{InMemoryReadModelRepository, ReadModelRepository};
use std::sync::Arc;
use uuid::Uuid;

type Repository = EventSourcedRepository<InMemoryEventStorage>;

fn repository() -> (Arc<InMemoryEventStorage>, Repository) {
    let storage = Arc::new(InMemoryEventStorage::new());
    (storage.clone(), EventSourcedRepository::new(storage))
}

async fn load(repo: &Repository, id: Uuid) -> Result<Account, DomainError> {
    AggregateRepository::<Account>::load(repo, &id).await
}

async fn save(repo: &Repository, account: &mut Account) -> Result<usize, DomainError> {
    AggregateRepository::<Account>::save(repo, account)
        .await
        .map(|events| events.len())
}

#[tokio::test]
async fn create_then_withdraw_replays_negative_balance() {
    let (_, repo) = repository();
    let id = Uuid::new_v4();
    let correlation = Uuid::new_v4();

    let mut account = Account::new(id);
    account.open("alice", correlation).unwrap();
    assert_eq!(save(&repo, &mut account).await.unwrap(), 1);

    let mut account = load(&repo, id).await.unwrap();
    account.withdraw(50, correlation).unwrap();
    save(&repo, &mut account).await.unwrap();
    assert!(account.uncommitted_events().is_empty());

    let fresh = load(&repo, id).await.unwrap();
    assert_eq!(fresh.balance(), -50);
    assert_eq!(fresh.version(), 2);
    assert_eq!(fresh.name(), "alice");
}

#[tokio::test]
async fn racing_withdrawals_conflict_then_retry() {
    let (storage, repo) = repository();
    let id = Uuid::new_v4();
    let correlation = Uuid::new_v4();

    let mut account = Account::new(id);
    account.open("bob", correlation).unwrap();
    account.deposit(100, correlation).unwrap();
    save(&repo, &mut account).await.unwrap();

    let mut first = load(&repo, id).await.unwrap();
    let mut second = load(&repo, id).await.unwrap();
    assert_eq!((first.version(), second.version()), (2, 2));

    first.withdraw(30, correlation).unwrap();
    second.withdraw(40, correlation).unwrap();

    save(&repo, &mut first).await.unwrap();
    assert_eq!(first.version(), 3);

    let err = save(&repo, &mut second).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::ConcurrencyConflict {
            expected: 2,
            actual: 3,
            ..
        }
    ));
    // 冲突后聚合保持原状，由调用方决定是否重试
    assert_eq!(second.version(), 3);
    assert_eq!(second.uncommitted_events().len(), 1);
    assert_eq!(storage.stream_len::<Account>(&id).await, 3);

    let mut retry = load(&repo, id).await.unwrap();
    assert_eq!(retry.version(), 3);
    retry.withdraw(40, correlation).unwrap();
    save(&repo, &mut retry).await.unwrap();

    let fresh = load(&repo, id).await.unwrap();
    assert_eq!(fresh.version(), 4);
    assert_eq!(fresh.balance(), 30);
}

#[tokio::test]
async fn conflict_surfaces_as_retryable_command_error() {
    let (_, repo) = repository();
    let id = Uuid::new_v4();
    let handler = AccountCommandHandler::new(AggregateRoot::<Account, _>::new(repo));
    let bus = InMemoryCommandBus::new();
    let handler = Arc::new(handler);
    bus.register::<CreateAccount, _>(handler.clone()).unwrap();

    let create = || CreateAccount {
        correlation_id: Uuid::new_v4(),
        account_id: id,
        name: "carol".to_string(),
    };
    bus.dispatch(&AppContext::default(), create()).await.unwrap();

    // 同一 ID 再次开户：新建的聚合期望版本 0，而流已在 1
    let err = bus
        .dispatch(&AppContext::default(), create())
        .await
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(DomainError::ConcurrencyConflict { .. })
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn withdrawal_projection_for_unseen_account_records_amount() {
    let read_model = Arc::new(InMemoryReadModelRepository::<TopAccountsReadModel>::new());
    let dispatcher = EventDispatcher::<AccountEvent>::default().with_handlers(account_projections(read_model.clone()));
    let id = Uuid::new_v4();

    let envelope = |version: usize, amount: i64| {
        let metadata = Metadata::builder()
            .event_id(Uuid::new_v4())
            .aggregate_id(id.to_string())
            .aggregate_type("account".to_string())
            .aggregate_version(version)
            .correlation_id(Uuid::new_v4())
            .occurred_at(Utc::now())
            .build();
        EventEnvelope::new(metadata, AccountEvent::FundsWithdrawn { amount })
    };

    let report = dispatcher.publish(&envelope(1, 50)).await;
    assert!(report.is_success());
    assert_eq!(report.succeeded, vec!["HandleWithdrawal".to_string()]);

    let model = read_model.get().await.unwrap().unwrap();
    assert_eq!(model.accounts, vec![AccountSummary { id, balance: 50 }]);

    dispatcher.publish(&envelope(2, 20)).await;
    let model = read_model.get().await.unwrap().unwrap();
    assert_eq!(model.account(id).unwrap().balance, 30);
}

#[tokio::test]
async fn command_bus_flow_updates_read_model() {
    let (storage, repo) = repository();
    let read_model = Arc::new(InMemoryReadModelRepository::<TopAccountsReadModel>::new());
    let dispatcher = EventDispatcher::<AccountEvent>::default().with_handlers(account_projections(read_model.clone()));
    let root = AggregateRoot::<Account, _>::new(repo).with_dispatcher(Arc::new(dispatcher));
    let handler = Arc::new(AccountCommandHandler::new(root));

    let bus = InMemoryCommandBus::new();
    bus.register::<CreateAccount, _>(handler.clone()).unwrap();
    bus.register::<DepositFunds, _>(handler.clone()).unwrap();
    bus.register::<WithdrawFunds, _>(handler.clone()).unwrap();

    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let ctx = AppContext::with_correlation_id(Uuid::new_v4());

    for (id, name) in [(alice, "alice"), (bob, "bob")] {
        bus.dispatch(
            &ctx,
            CreateAccount {
                correlation_id: Uuid::new_v4(),
                account_id: id,
                name: name.to_string(),
            },
        )
        .await
        .unwrap();
    }
    bus.dispatch(
        &ctx,
        DepositFunds {
            correlation_id: Uuid::new_v4(),
            account_id: alice,
            amount: 200,
        },
    )
    .await
    .unwrap();
    bus.dispatch(
        &ctx,
        WithdrawFunds {
            correlation_id: Uuid::new_v4(),
            account_id: bob,
            amount: 50,
        },
    )
    .await
    .unwrap();

    assert_eq!(storage.event_count().await, 4);

    let model = read_model.get().await.unwrap().unwrap();
    assert_eq!(
        model.top(2),
        vec![
            AccountSummary {
                id: alice,
                balance: 200
            },
            AccountSummary {
                id: bob,
                balance: -50
            },
        ]
    );

    let loaded = load(handler.root().repository(), bob).await.unwrap();
    assert_eq!((loaded.balance(), loaded.version()), (-50, 2));
}

#[tokio::test]
async fn commands_against_missing_account_or_bad_input_are_rejected() {
    let (storage, repo) = repository();
    let handler = Arc::new(AccountCommandHandler::new(AggregateRoot::<Account, _>::new(repo)));
    let bus = InMemoryCommandBus::new();
    bus.register::<CreateAccount, _>(handler.clone()).unwrap();
    bus.register::<WithdrawFunds, _>(handler.clone()).unwrap();

    let err = bus
        .dispatch(
            &AppContext::default(),
            WithdrawFunds {
                correlation_id: Uuid::new_v4(),
                account_id: Uuid::new_v4(),
                amount: 10,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(DomainError::AggregateNotFound { .. })
    ));

    let err = bus
        .dispatch(
            &AppContext::default(),
            CreateAccount {
                correlation_id: Uuid::new_v4(),
                account_id: Uuid::new_v4(),
                name: " ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = bus
        .dispatch(
            &AppContext::default(),
            DepositFunds {
                correlation_id: Uuid::new_v4(),
                account_id: Uuid::new_v4(),
                amount: 10,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::HandlerNotFound("DepositFunds")));

    assert_eq!(storage.event_count().await, 0);
}
