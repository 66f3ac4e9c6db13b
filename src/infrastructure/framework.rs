//! Update loop - The single task allowed to read game-world tables
//!
//! `FrameworkLoop` owns the world reader and drains a job queue: checks sent
//! by background tasks and intercepted interaction calls. `FrameworkHandle` is
//! the cloneable sender side and implements `FrameworkPort`.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::ports::inbound::InteractionTarget;
use crate::application::ports::outbound::{
    FrameworkCheck, FrameworkError, FrameworkPort, GameWorldPort,
};
use crate::infrastructure::interaction_hook::InteractionHook;

enum FrameworkJob {
    Check {
        check: FrameworkCheck,
        reply: oneshot::Sender<bool>,
    },
    Interact {
        target: InteractionTarget,
    },
}

pub struct FrameworkLoop {
    world: Box<dyn GameWorldPort>,
    hook: InteractionHook,
    jobs: mpsc::UnboundedReceiver<FrameworkJob>,
}

#[derive(Clone)]
pub struct FrameworkHandle {
    jobs: mpsc::UnboundedSender<FrameworkJob>,
}

impl FrameworkLoop {
    pub fn new(world: Box<dyn GameWorldPort>) -> (Self, FrameworkHandle) {
        let (sender, jobs) = mpsc::unbounded_channel();
        let framework = Self {
            world,
            hook: InteractionHook::new(),
            jobs,
        };
        (framework, FrameworkHandle { jobs: sender })
    }

    pub fn with_hook(mut self, hook: InteractionHook) -> Self {
        self.hook = hook;
        self
    }

    /// Drain jobs until every handle is dropped or `cancel_token` fires
    pub async fn run(mut self, cancel_token: CancellationToken) {
        info!("Starting update loop");
        loop {
            let job = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                job = self.jobs.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };
            match job {
                FrameworkJob::Check { check, reply } => {
                    let result = check(self.world.as_ref());
                    // The requester may have given up; nothing to do then
                    let _ = reply.send(result);
                }
                FrameworkJob::Interact { target } => {
                    self.hook.detour(&target, self.world.as_ref(), || {
                        debug!(
                            object_id = target.object_id,
                            kind = ?target.object_kind,
                            "Interaction forwarded"
                        );
                    });
                }
            }
        }
        info!("Update loop stopped");
    }
}

impl FrameworkHandle {
    /// Queue an intercepted interaction call for the update loop
    pub fn interact(&self, target: InteractionTarget) -> Result<(), FrameworkError> {
        self.jobs
            .send(FrameworkJob::Interact { target })
            .map_err(|_| FrameworkError::Stopped)
    }
}

#[async_trait]
impl FrameworkPort for FrameworkHandle {
    async fn run_check(&self, check: FrameworkCheck) -> Result<bool, FrameworkError> {
        let (reply, answer) = oneshot::channel();
        self.jobs
            .send(FrameworkJob::Check { check, reply })
            .map_err(|_| FrameworkError::Stopped)?;
        answer.await.map_err(|_| FrameworkError::Stopped)
    }
}

/// Tables of the simulated game world
#[derive(Debug, Clone, Default)]
pub struct WorldTables {
    pub party_size: usize,
    pub loot_table: HashSet<u64>,
    pub deep_dungeon_coffers: HashSet<u64>,
}

/// World reader over shared tables the simulator can edit
#[derive(Clone, Default)]
pub struct SimulatedWorld {
    tables: Arc<RwLock<WorldTables>>,
}

impl SimulatedWorld {
    pub fn new(tables: WorldTables) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    pub fn edit(&self, change: impl FnOnce(&mut WorldTables)) {
        if let Ok(mut tables) = self.tables.write() {
            change(&mut tables);
        }
    }

    fn read<R>(&self, query: impl FnOnce(&WorldTables) -> R, fallback: R) -> R {
        self.tables.read().map(|t| query(&t)).unwrap_or(fallback)
    }
}

impl GameWorldPort for SimulatedWorld {
    fn party_size(&self) -> usize {
        self.read(|t| t.party_size.max(1), 1)
    }

    fn loot_table_contains(&self, object_id: u64) -> bool {
        self.read(|t| t.loot_table.contains(&object_id), false)
    }

    fn is_deep_dungeon_coffer(&self, object_id: u64) -> bool {
        self.read(|t| t.deep_dungeon_coffers.contains(&object_id), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_checks_run_on_the_loop() {
        let world = SimulatedWorld::new(WorldTables {
            party_size: 4,
            loot_table: HashSet::from([9]),
            ..Default::default()
        });
        let (framework, handle) = FrameworkLoop::new(Box::new(world));
        let token = CancellationToken::new();
        let running = tokio::spawn(framework.run(token.clone()));

        let in_table = handle
            .run_check(Box::new(|world: &dyn GameWorldPort| world.loot_table_contains(9)))
            .await;
        assert_eq!(in_table, Ok(true));
        let party = handle
            .run_check(Box::new(|world: &dyn GameWorldPort| world.party_size() > 1))
            .await;
        assert_eq!(party, Ok(true));

        token.cancel();
        running.await.unwrap();
        let after_stop = handle
            .run_check(Box::new(|_: &dyn GameWorldPort| true))
            .await;
        assert_eq!(after_stop, Err(FrameworkError::Stopped));
    }
}
