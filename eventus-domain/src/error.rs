//! 领域层统一错误定义
//!
//! 按事件溯源运行时的失败语义分组：注册期错误、重放完整性错误、并发冲突、
//! 聚合不存在、读模型处理器错误，以及序列化/存储等基础设施错误。
//! 仅 `ConcurrencyConflict` 设计为由调用方重新加载后重试。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 注册期（编程缺陷，不可重试） ---
    #[error("duplicate event handler: aggregate={aggregate_type}, event={event_type}")]
    DuplicateHandler {
        aggregate_type: String,
        event_type: String,
    },
    #[error("handler registration failed: aggregate={aggregate_type}, reason={reason}")]
    Registration {
        aggregate_type: String,
        reason: String,
    },

    // --- 重放完整性 ---
    #[error("unhandled event: aggregate={aggregate_type}, event={event_type}")]
    UnhandledEvent {
        aggregate_type: String,
        event_type: String,
    },
    #[error(
        "event out of sequence: aggregate={aggregate_type}, id={aggregate_id}, expected={expected}, found={found}"
    )]
    OutOfSequence {
        aggregate_type: String,
        aggregate_id: String,
        expected: usize,
        found: usize,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },
    #[error("aggregate mismatch: expected={expected}, found={found}")]
    AggregateMismatch { expected: String, found: String },

    // --- 并发 ---
    #[error(
        "concurrency conflict: aggregate={aggregate_type}, id={aggregate_id}, expected={expected}, actual={actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: String,
        aggregate_id: String,
        expected: usize,
        actual: usize,
    },

    // --- 不存在 ---
    #[error("aggregate not found: aggregate={aggregate_type}, id={aggregate_id}")]
    AggregateNotFound {
        aggregate_type: String,
        aggregate_id: String,
    },

    // --- 读模型 ---
    #[error("event handler error: handler={handler}, reason={reason}")]
    EventHandler { handler: String, reason: String },

    // --- 序列化/存储 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("parse error: {reason}")]
    Parse { reason: String },
    #[error("storage error: {reason}")]
    Storage { reason: String },

    // --- 领域规则 ---
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
}

/// 错误分类，对应运行时的错误处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 处理器声明缺陷，首次使用聚合类型时即暴露
    Registration,
    /// 历史损坏或事件与聚合代码不匹配
    ReplayIntegrity,
    /// 乐观并发冲突，调用方重新加载后重试
    Concurrency,
    /// 聚合尚不存在
    NotFound,
    /// 单个读模型处理器失败
    Handler,
    /// 序列化、存储等基础设施失败
    Infrastructure,
    /// 业务规则拒绝
    Domain,
}

impl DomainError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateHandler { .. } | Self::Registration { .. } => {
                ErrorCategory::Registration
            }
            Self::UnhandledEvent { .. }
            | Self::OutOfSequence { .. }
            | Self::TypeMismatch { .. }
            | Self::AggregateMismatch { .. } => ErrorCategory::ReplayIntegrity,
            Self::ConcurrencyConflict { .. } => ErrorCategory::Concurrency,
            Self::AggregateNotFound { .. } => ErrorCategory::NotFound,
            Self::EventHandler { .. } => ErrorCategory::Handler,
            Self::Serde { .. } | Self::Parse { .. } | Self::Storage { .. } => {
                ErrorCategory::Infrastructure
            }
            Self::InvalidCommand { .. } | Self::InvalidState { .. } => ErrorCategory::Domain,
        }
    }

    /// 仅并发冲突允许调用方重试
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Concurrency
    }

    pub fn invalid_command(reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl From<uuid::Error> for DomainError {
    fn from(err: uuid::Error) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}
