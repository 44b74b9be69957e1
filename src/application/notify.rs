use std::sync::Mutex;

use serde_json::Value;

use crate::domain::Charge;

/// What happened, from the notification subsystem's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ChargeCreated,
    PaymentConfirmed,
    Delinquency,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ChargeCreated => "charge_created",
            EventKind::PaymentConfirmed => "payment_confirmed",
            EventKind::Delinquency => "delinquency",
        }
    }
}

/// Who should hear about it. Channel selection and template rendering are
/// the dispatcher's problem; the lifecycle only picks the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientSet {
    BillingOps,
    Management,
    Escalation,
}

impl RecipientSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientSet::BillingOps => "billing_ops",
            RecipientSet::Management => "management",
            RecipientSet::Escalation => "escalation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub charge: Charge,
    pub recipients: RecipientSet,
    pub metadata: Value,
}

/// Outbound notification boundary, injected into the billing service at
/// construction. Delivery is best-effort: a returned error is logged by the
/// caller and never rolls back the state change that triggered it.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, event: NotificationEvent) -> anyhow::Result<()>;
}

/// Dispatcher that emits events as structured log lines. The default for
/// the CLI, where no mail/in-app channel is wired up.
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn dispatch(&self, event: NotificationEvent) -> anyhow::Result<()> {
        tracing::info!(
            event = event.kind.as_str(),
            recipients = event.recipients.as_str(),
            charge_id = %event.charge.id,
            reference = %event.charge.reference,
            amount_cents = event.charge.amount_cents,
            metadata = %event.metadata,
            "notification"
        );
        Ok(())
    }
}

/// Dispatcher that collects events in memory, for tests and dry runs.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: NotificationEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Dispatcher that always fails, for exercising the best-effort contract.
pub struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn dispatch(&self, _event: NotificationEvent) -> anyhow::Result<()> {
        anyhow::bail!("notification channel unavailable")
    }
}
