use crate::command::Command;
use uuid::Uuid;

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用所需的横切信息：
/// - 关联 ID（`correlation_id`）：若设置则覆盖命令自带的关联 ID，用于把多条命令串到同一链路；
/// - 幂等键（`idempotency_key`）：用于在基础设施层实现请求幂等（如 API 层重复提交保护）。
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub correlation_id: Option<Uuid>,
    /// 幂等键（可选）：为空则由上层或基础设施决定是否参与幂等
    pub idempotency_key: Option<String>,
}

impl AppContext {
    pub fn with_correlation_id(correlation_id: Uuid) -> Self {
        Self {
            correlation_id: Some(correlation_id),
            idempotency_key: None,
        }
    }

    /// 命令最终使用的关联 ID
    pub fn correlation_for<C: Command>(&self, cmd: &C) -> Uuid {
        self.correlation_id.unwrap_or_else(|| cmd.correlation_id())
    }
}
