//! 账户命令与命令处理器
//!
use crate::account::Account;
use async_trait::async_trait;
use eventus_application::{AppContext, AppError, Command, CommandHandler};
use eventus_domain::aggregate_root::{AggregateRoot, Execution};
use eventus_domain::persist::AggregateRepository;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub correlation_id: Uuid,
    pub account_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DepositFunds {
    pub correlation_id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct WithdrawFunds {
    pub correlation_id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
}

macro_rules! account_command {
    ($ty:ty, $name:literal) => {
        impl Command for $ty {
            const NAME: &'static str = $name;
            type AggregateId = Uuid;

            fn correlation_id(&self) -> Uuid {
                self.correlation_id
            }

            fn aggregate_id(&self) -> &Uuid {
                &self.account_id
            }
        }
    };
}

account_command!(CreateAccount, "CreateAccount");
account_command!(DepositFunds, "DepositFunds");
account_command!(WithdrawFunds, "WithdrawFunds");

/// 账户命令处理器：每条命令对应一次“加载/新建 → 业务方法 → 保存 → 分发”
pub struct AccountCommandHandler<R>
where
    R: AggregateRepository<Account>,
{
    root: AggregateRoot<Account, R>,
}

impl<R> AccountCommandHandler<R>
where
    R: AggregateRepository<Account>,
{
    pub fn new(root: AggregateRoot<Account, R>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &AggregateRoot<Account, R> {
        &self.root
    }
}

fn report(execution: &Execution<Account>) {
    for failure in execution.reports.iter().flat_map(|r| r.failures.iter()) {
        tracing::warn!(
            handler = %failure.handler,
            reason = %failure.reason,
            "read model not updated"
        );
    }
}

#[async_trait]
impl<R> CommandHandler<CreateAccount> for AccountCommandHandler<R>
where
    R: AggregateRepository<Account>,
{
    async fn handle(&self, ctx: &AppContext, cmd: CreateAccount) -> Result<(), AppError> {
        if cmd.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let correlation_id = ctx.correlation_for(&cmd);
        let execution = self
            .root
            .create(cmd.account_id, |account| {
                account.open(&cmd.name, correlation_id)
            })
            .await?;

        report(&execution);
        Ok(())
    }
}

#[async_trait]
impl<R> CommandHandler<DepositFunds> for AccountCommandHandler<R>
where
    R: AggregateRepository<Account>,
{
    async fn handle(&self, ctx: &AppContext, cmd: DepositFunds) -> Result<(), AppError> {
        let correlation_id = ctx.correlation_for(&cmd);
        let execution = self
            .root
            .update(&cmd.account_id, |account| {
                account.deposit(cmd.amount, correlation_id)
            })
            .await?;

        report(&execution);
        Ok(())
    }
}

#[async_trait]
impl<R> CommandHandler<WithdrawFunds> for AccountCommandHandler<R>
where
    R: AggregateRepository<Account>,
{
    async fn handle(&self, ctx: &AppContext, cmd: WithdrawFunds) -> Result<(), AppError> {
        let correlation_id = ctx.correlation_for(&cmd);
        let execution = self
            .root
            .update(&cmd.account_id, |account| {
                account.withdraw(cmd.amount, correlation_id)
            })
            .await?;

        report(&execution);
        Ok(())
    }
}
