//! Assertions over recorded calls and audit trails.

use decider_events::{AuditEventKind, EventBus};

use crate::mocks::{Call, CallLog};

/// Assert that the first call matching `first` precedes the first matching `second`.
///
/// # Panics
///
/// Panics when either call is missing or they are out of order.
pub fn assert_call_order(log: &CallLog, first: fn(&Call) -> bool, second: fn(&Call) -> bool) {
    let calls = log.calls();
    let a = calls.iter().position(first).expect("first call recorded");
    let b = calls.iter().position(second).expect("second call recorded");
    assert!(a < b, "expected call {a} before {b}: {calls:?}");
}

/// Event names recorded on `bus`, oldest first.
#[must_use]
pub fn audit_kinds(bus: &EventBus) -> Vec<AuditEventKind> {
    bus.recorded().into_iter().map(|event| event.event).collect()
}

/// Whether `bus` recorded at least one `kind` event.
#[must_use]
pub fn audited(bus: &EventBus, kind: AuditEventKind) -> bool {
    audit_kinds(bus).contains(&kind)
}

/// Predicate matching enqueue calls.
#[must_use]
pub const fn is_enqueue(call: &Call) -> bool {
    matches!(call, Call::Enqueue { .. })
}

/// Predicate matching trigger calls.
#[must_use]
pub const fn is_trigger(call: &Call) -> bool {
    matches!(call, Call::Trigger { .. })
}
