use std::fmt::Display;
use uuid::Uuid;

/// 应用层命令（Command）
///
/// 表达“意图”的写操作请求，针对单个聚合实例。
/// - 不返回业务数据，仅表达执行结果（成功/失败）；
/// - 携带关联 ID（`correlation_id`），该命令产生的所有事件共享同一关联 ID；
/// - 建议保持语义化的“动宾结构”命名，如 `OpenAccount`、`WithdrawFunds`。
///
/// 关联常量：
/// - `NAME`：命令的稳定名称，用于日志、追踪与路由。避免依赖 `type_name::<T>()`。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 目标聚合的标识类型
    type AggregateId: Clone + Display + Send + Sync + 'static;

    fn correlation_id(&self) -> Uuid;

    fn aggregate_id(&self) -> &Self::AggregateId;
}
