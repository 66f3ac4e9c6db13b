//! Framework port - Access to game-memory-backed state on the update loop
//!
//! Game tables may only be read from the single-threaded update loop.
//! Background tasks hand a check to the loop through `FrameworkPort` and await
//! its answer.

use async_trait::async_trait;

/// Reads of live game state; only valid on the update loop
pub trait GameWorldPort: Send {
    /// Number of party members including the local player; 1 when solo
    fn party_size(&self) -> usize;

    /// Whether `object_id` appears in the party's live loot table
    fn loot_table_contains(&self, object_id: u64) -> bool;

    fn is_deep_dungeon_coffer(&self, object_id: u64) -> bool;
}

/// A check executed on the update loop
pub type FrameworkCheck = Box<dyn FnOnce(&dyn GameWorldPort) -> bool + Send>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameworkError {
    #[error("Update loop has stopped")]
    Stopped,
}

#[async_trait]
pub trait FrameworkPort: Send + Sync {
    async fn run_check(&self, check: FrameworkCheck) -> Result<bool, FrameworkError>;
}
