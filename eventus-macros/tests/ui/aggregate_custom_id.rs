use eventus_domain::entity::{Entity, EventSourced};
use eventus_macros::{aggregate, domain_event};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
struct OrderId(u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order-{}", self.0)
    }
}

#[domain_event(version = 2)]
enum OrderEvent {
    Placed { lines: u32 },
}

// 自定义 Debug：不派生
#[aggregate(id = OrderId, event = OrderEvent, debug = false)]
struct Order {
    lines: u32,
}

impl fmt::Debug for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order({}, v{})", self.id, self.version)
    }
}

fn main() {
    let mut order = Order::new(OrderId(7));
    assert_eq!(order.id(), &OrderId(7));
    assert_eq!(format!("{order:?}"), "Order(order-7, v0)");

    order.set_version(4);
    assert_eq!(order.version(), 4);
    assert_eq!(order.lines, 0);
    assert!(order.uncommitted_events_mut().is_empty());
}
