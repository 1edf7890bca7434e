// 单元测试共用的计数器聚合
use crate::aggregate::Aggregate;
use crate::domain_event::{EventEnvelope, Metadata};
use crate::error::DomainResult;
use crate::handler_registry::HandlerTable;
use chrono::Utc;
use eventus_macros::{aggregate, domain_event};
use uuid::Uuid;

#[domain_event(version = 1)]
pub(crate) enum CounterEvent {
    Added { amount: i64 },
    Subtracted { amount: i64 },
}

#[aggregate(id = String, event = CounterEvent)]
pub(crate) struct Counter {
    pub(crate) value: i64,
}

impl Counter {
    fn added(&mut self, event: &CounterEvent) {
        if let CounterEvent::Added { amount } = event {
            self.value += amount;
        }
    }

    fn subtracted(&mut self, event: &CounterEvent) {
        if let CounterEvent::Subtracted { amount } = event {
            self.value -= amount;
        }
    }
}

impl Aggregate for Counter {
    const TYPE: &'static str = "counter";

    fn register_handlers(handlers: &mut HandlerTable<Self>) -> DomainResult<()> {
        handlers
            .on(CounterEventKind::Added, Self::added)?
            .on(CounterEventKind::Subtracted, Self::subtracted)?;
        Ok(())
    }
}

/// 构造一段连续的历史：正数为 Added，负数为 Subtracted
pub(crate) fn history(aggregate_id: &str, amounts: &[i64]) -> Vec<EventEnvelope<CounterEvent>> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            let payload = if *amount >= 0 {
                CounterEvent::Added { amount: *amount }
            } else {
                CounterEvent::Subtracted { amount: -amount }
            };
            let metadata = Metadata::builder()
                .event_id(Uuid::new_v4())
                .aggregate_id(aggregate_id.to_string())
                .aggregate_type(Counter::TYPE.to_string())
                .aggregate_version(i + 1)
                .correlation_id(Uuid::new_v4())
                .occurred_at(Utc::now())
                .build();
            EventEnvelope::new(metadata, payload)
        })
        .collect()
}
