//! World-interaction hook boundary
//!
//! Observers see every intercepted interaction call but can never suppress it:
//! the original call runs exactly once after the observers, whatever they do.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, warn};

use crate::application::ports::inbound::{InteractionObserver, InteractionTarget};
use crate::application::ports::outbound::GameWorldPort;

#[derive(Default, Clone)]
pub struct InteractionHook {
    observers: Vec<Arc<dyn InteractionObserver>>,
}

impl InteractionHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Arc<dyn InteractionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Run observers, then forward to `original` and return its result
    pub fn detour<R>(
        &self,
        target: &InteractionTarget,
        world: &dyn GameWorldPort,
        original: impl FnOnce() -> R,
    ) -> R {
        for observer in &self.observers {
            match catch_unwind(AssertUnwindSafe(|| observer.on_interaction(target, world))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    error = %e,
                    object_id = target.object_id,
                    "Interaction observer failed"
                ),
                Err(_) => error!(object_id = target.object_id, "Interaction observer panicked"),
            }
        }
        original()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::application::ports::inbound::ObjectKind;

    struct EmptyWorld;

    impl GameWorldPort for EmptyWorld {
        fn party_size(&self) -> usize {
            1
        }

        fn loot_table_contains(&self, _object_id: u64) -> bool {
            false
        }

        fn is_deep_dungeon_coffer(&self, _object_id: u64) -> bool {
            false
        }
    }

    struct Panicking;

    impl InteractionObserver for Panicking {
        fn on_interaction(&self, _: &InteractionTarget, _: &dyn GameWorldPort) -> anyhow::Result<()> {
            panic!("malformed object table");
        }
    }

    struct Failing;

    impl InteractionObserver for Failing {
        fn on_interaction(&self, _: &InteractionTarget, _: &dyn GameWorldPort) -> anyhow::Result<()> {
            anyhow::bail!("object kind out of range")
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl InteractionObserver for Counting {
        fn on_interaction(&self, _: &InteractionTarget, _: &dyn GameWorldPort) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_original_runs_once_despite_failing_observers() {
        let counting = Arc::new(Counting::default());
        let hook = InteractionHook::new()
            .with_observer(Arc::new(Panicking))
            .with_observer(Arc::new(Failing))
            .with_observer(counting.clone());
        let target = InteractionTarget {
            object_kind: ObjectKind::Treasure,
            object_id: 42,
            check_line_of_sight: true,
        };

        let calls = AtomicUsize::new(0);
        let result = hook.detour(&target, &EmptyWorld, || {
            calls.fetch_add(1, Ordering::SeqCst);
            7u64
        });

        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }
}
