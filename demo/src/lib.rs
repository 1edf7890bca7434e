//! 银行账户示例：聚合、命令处理与读模型投影
//!
pub mod account;
pub mod commands;
pub mod projections;
