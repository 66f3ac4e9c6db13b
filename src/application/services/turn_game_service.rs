//! Turn Game Service - Reconstructs turn-based dice games from chat
//!
//! The tracker is owned by the chat consumer and mutated through `&mut self`,
//! one line at a time. Unparseable or unmatched lines are dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::ports::inbound::ChatLine;
use crate::application::ports::outbound::{ClockPort, EventBusPort};
use crate::domain::entities::{RollMessage, TurnGameSession, TurnGameState};
use crate::domain::events::{AutomationEvent, SocialGame, SocialResult};
use crate::domain::value_objects::PlayerName;

/// A finished game; the loser rolled the 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnGameCompletion {
    pub winner: PlayerName,
    pub loser: PlayerName,
}

pub struct TurnGameTracker {
    client_name: PlayerName,
    /// Keyed by initializer
    sessions: HashMap<PlayerName, TurnGameSession>,
    clock: Arc<dyn ClockPort>,
    events: Arc<dyn EventBusPort>,
}

impl TurnGameTracker {
    pub fn new(
        client_name: PlayerName,
        clock: Arc<dyn ClockPort>,
        events: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            client_name,
            sessions: HashMap::new(),
            clock,
            events,
        }
    }

    /// Feed one chat line; returns the completion if this line ended a game
    pub fn process_chat(&mut self, line: &ChatLine) -> Option<TurnGameCompletion> {
        let roll = RollMessage::parse(&line.message)?;
        match roll.roll {
            None => {
                self.start_session(&line.sender, roll.cap);
                None
            }
            Some(value) => self.continue_session(&line.sender, value, roll.cap),
        }
    }

    /// Cap of the most recently active session involving `player`
    pub fn get_active_cap_for_player(&self, player: &PlayerName) -> Option<u32> {
        self.sessions
            .values()
            .filter(|s| !s.is_complete && s.involves(player))
            .max_by_key(|s| s.last_roll_time)
            .map(|s| s.current_roll_cap)
    }

    pub fn session(&self, initializer: &PlayerName) -> Option<&TurnGameSession> {
        self.sessions.get(initializer)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn start_session(&mut self, sender: &PlayerName, cap: u32) {
        self.evict_player(sender, None);
        let session = TurnGameSession::open(sender.clone(), cap, self.clock.now());
        self.sessions.insert(sender.clone(), session);
        debug!(initializer = %sender, cap, "Opened turn-game session");
    }

    fn continue_session(
        &mut self,
        sender: &PlayerName,
        roll: u32,
        cap: u32,
    ) -> Option<TurnGameCompletion> {
        let Some(key) = self
            .sessions
            .values()
            .filter(|s| s.accepts_roll_from(sender, cap))
            .max_by_key(|s| s.last_roll_time)
            .map(|s| s.initializer.clone())
        else {
            debug!(sender = %sender, roll, cap, "Roll matches no session");
            return None;
        };

        let joining = self
            .sessions
            .get(&key)
            .is_some_and(|s| s.state() == TurnGameState::Open);
        if joining {
            self.evict_player(sender, Some(&key));
        }

        let now = self.clock.now();
        let session = self.sessions.get_mut(&key)?;
        if !session.record_roll(sender, roll, now) {
            debug!(initializer = %key, roller = %sender, roll, "Recorded roll");
            return None;
        }

        let finished = self.sessions.remove(&key)?;
        let winner = finished.other_party(sender)?.clone();
        let completion = TurnGameCompletion {
            winner,
            loser: sender.clone(),
        };
        info!(winner = %completion.winner, loser = %completion.loser, "Turn game complete");
        self.publish_result(&completion);
        Some(completion)
    }

    /// Drop every session `player` is party to, except the one keyed by `keep`
    fn evict_player(&mut self, player: &PlayerName, keep: Option<&PlayerName>) {
        self.sessions.retain(|initializer, session| {
            let kept = Some(initializer) == keep || !session.involves(player);
            if !kept {
                debug!(initializer = %initializer, player = %player, "Evicted turn-game session");
            }
            kept
        });
    }

    fn publish_result(&self, completion: &TurnGameCompletion) {
        let (result, opponent) = if completion.winner == self.client_name {
            (SocialResult::Win, completion.loser.clone())
        } else if completion.loser == self.client_name {
            (SocialResult::Loss, completion.winner.clone())
        } else {
            return;
        };
        self.events.publish(AutomationEvent::SocialGameResult {
            game: SocialGame::TurnGame,
            result,
            opponent,
        });
    }
}
