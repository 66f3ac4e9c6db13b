use crate::domain::events::AutomationEvent;

/// Sink for automation events; publishing never blocks the caller
#[cfg_attr(test, mockall::automock)]
pub trait EventBusPort: Send + Sync {
    fn publish(&self, event: AutomationEvent);
}
