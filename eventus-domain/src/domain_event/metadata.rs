use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 元数据：事件的身份、归属聚合、序号与发生时间
#[derive(Builder, Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    event_id: Uuid,
    aggregate_id: String,
    aggregate_type: String,
    /// 聚合内从 1 开始连续递增的序号
    aggregate_version: usize,
    correlation_id: Uuid,
    occurred_at: DateTime<Utc>,
}

impl Metadata {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_version(&self) -> usize {
        self.aggregate_version
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn occurred_at(&self) -> &DateTime<Utc> {
        &self.occurred_at
    }
}
