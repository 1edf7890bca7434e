//! 银行账户聚合
//!
//! 余额允许为负（透支不在本例的业务规则内）。
//!
use eventus_domain::aggregate::Aggregate;
use eventus_domain::entity::Entity;
use eventus_domain::error::{DomainError, DomainResult};
use eventus_domain::handler_registry::HandlerTable;
use eventus_macros::{aggregate, domain_event};
use uuid::Uuid;

#[domain_event(version = 1)]
pub enum AccountEvent {
    #[event(event_type = "account.created")]
    AccountCreated { name: String },
    #[event(event_type = "account.deposited")]
    FundsDeposited { amount: i64 },
    #[event(event_type = "account.withdrawn")]
    FundsWithdrawn { amount: i64 },
}

#[aggregate(id = Uuid, event = AccountEvent)]
pub struct Account {
    name: String,
    balance: i64,
}

impl Account {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn is_open(&self) -> bool {
        self.version() > 0
    }

    pub fn open(&mut self, name: &str, correlation_id: Uuid) -> DomainResult<()> {
        if self.is_open() {
            return Err(DomainError::invalid_state(format!(
                "account {} already opened",
                self.id()
            )));
        }
        if name.trim().is_empty() {
            return Err(DomainError::invalid_command("account name must not be empty"));
        }

        self.raise_event(
            AccountEvent::AccountCreated {
                name: name.to_string(),
            },
            correlation_id,
        )
    }

    pub fn deposit(&mut self, amount: i64, correlation_id: Uuid) -> DomainResult<()> {
        self.ensure_open()?;
        ensure_positive(amount)?;
        self.balance
            .checked_add(amount)
            .ok_or_else(|| DomainError::invalid_command("deposit would overflow the balance"))?;
        self.raise_event(AccountEvent::FundsDeposited { amount }, correlation_id)
    }

    pub fn withdraw(&mut self, amount: i64, correlation_id: Uuid) -> DomainResult<()> {
        self.ensure_open()?;
        ensure_positive(amount)?;
        self.balance
            .checked_sub(amount)
            .ok_or_else(|| DomainError::invalid_command("withdrawal would overflow the balance"))?;
        self.raise_event(AccountEvent::FundsWithdrawn { amount }, correlation_id)
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if !self.is_open() {
            return Err(DomainError::invalid_state(format!(
                "account {} not opened",
                self.id()
            )));
        }
        Ok(())
    }

    // --- 事件处理函数 ---

    fn created(&mut self, event: &AccountEvent) {
        let AccountEvent::AccountCreated { name } = event else {
            debug_assert!(false, "created handler keyed to {event:?}");
            return;
        };
        self.name = name.clone();
        self.balance = 0;
    }

    fn deposited(&mut self, event: &AccountEvent) {
        let AccountEvent::FundsDeposited { amount } = event else {
            debug_assert!(false, "deposited handler keyed to {event:?}");
            return;
        };
        self.balance += amount;
    }

    fn withdrawn(&mut self, event: &AccountEvent) {
        let AccountEvent::FundsWithdrawn { amount } = event else {
            debug_assert!(false, "withdrawn handler keyed to {event:?}");
            return;
        };
        self.balance -= amount;
    }
}

fn ensure_positive(amount: i64) -> DomainResult<()> {
    if amount <= 0 {
        return Err(DomainError::invalid_command(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

impl Aggregate for Account {
    const TYPE: &'static str = "account";

    fn register_handlers(handlers: &mut HandlerTable<Self>) -> DomainResult<()> {
        handlers
            .on(AccountEventKind::AccountCreated, Self::created)?
            .on(AccountEventKind::FundsDeposited, Self::deposited)?
            .on(AccountEventKind::FundsWithdrawn, Self::withdrawn)?;
        Ok(())
    }
}
