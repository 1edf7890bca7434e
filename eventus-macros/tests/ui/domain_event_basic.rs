use eventus_domain::domain_event::DomainEvent;
use eventus_macros::domain_event;

#[domain_event(version = 3)]
pub enum BankEvent {
    #[event(event_type = "bank.opened")]
    Opened { name: String },
    #[event(event_type = "bank.renamed", event_version = 5)]
    Renamed { to: String },
    Closed {},
}

fn main() {
    let opened = BankEvent::Opened {
        name: "alice".into(),
    };
    assert_eq!(opened.kind(), BankEventKind::Opened);
    assert_eq!(opened.event_type(), "bank.opened");
    assert_eq!(opened.event_version(), 3);

    let renamed = BankEvent::Renamed { to: "bob".into() };
    assert_eq!(renamed.event_type(), "bank.renamed");
    assert_eq!(renamed.event_version(), 5);

    let closed = BankEvent::Closed {};
    assert_eq!(closed.event_type(), "BankEvent.Closed");
    assert_eq!(BankEventKind::Closed.to_string(), "BankEvent.Closed");

    assert_eq!(
        BankEventKind::ALL,
        &[
            BankEventKind::Opened,
            BankEventKind::Renamed,
            BankEventKind::Closed
        ]
    );

    // 自动派生的 Clone + PartialEq
    assert_eq!(renamed.clone(), renamed);
}
