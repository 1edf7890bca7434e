use eventus_domain::aggregate::Aggregate;
use eventus_domain::entity::{Entity, EventSourced};
use eventus_domain::error::DomainResult;
use eventus_domain::handler_registry::HandlerTable;
use eventus_macros::{aggregate, domain_event};

#[domain_event]
enum AccountEvent {
    Opened { name: String },
}

#[aggregate(id = String, event = AccountEvent)]
struct Account {
    name: String,
}

impl Account {
    fn opened(&mut self, event: &AccountEvent) {
        let AccountEvent::Opened { name } = event;
        self.name = name.clone();
    }
}

impl Aggregate for Account {
    const TYPE: &'static str = "account";

    fn register_handlers(handlers: &mut HandlerTable<Self>) -> DomainResult<()> {
        handlers.on(AccountEventKind::Opened, Self::opened)?;
        Ok(())
    }
}

fn main() {
    let mut account = Account::new("a-1".to_string());
    assert_eq!(account.id(), "a-1");
    assert_eq!(account.version(), 0);
    assert!(account.uncommitted_events().is_empty());

    account
        .raise_event(
            AccountEvent::Opened {
                name: "alice".into(),
            },
            uuid::Uuid::new_v4(),
        )
        .unwrap();

    assert_eq!(account.name, "alice");
    assert_eq!(account.version(), 1);
    assert_eq!(account.uncommitted_events().len(), 1);

    // 自动派生的 Debug + Clone
    let copy = account.clone();
    assert!(format!("{copy:?}").contains("alice"));
}
