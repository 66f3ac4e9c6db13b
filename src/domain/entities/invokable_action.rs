//! Invokable actions - The state change a trigger performs when it fires
//!
//! Each variant is handled by exactly one handler in the action executor.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    GagRef, MoodleRef, NewState, RestraintId, RestrictionId, ShockInstruction, ToyInstruction,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvokableAction {
    /// Send a chat command as the local player
    TextOutput { command: String },

    /// Apply or remove a gag layer
    Gag { gag: GagRef, new_state: NewState },

    /// Apply, swap or remove the worn restraint set
    Restraint {
        restraint_id: RestraintId,
        new_state: NewState,
    },

    /// Apply or remove a generic restriction layer
    Restriction {
        restriction_id: RestrictionId,
        new_state: NewState,
    },

    /// Apply a mood-effect status or preset
    Moodle { moodle: MoodleRef },

    /// Send an instruction to the remote shock collar
    ShockCollar { instruction: ShockInstruction },

    /// Send an instruction to connected toys
    SexToy { instruction: ToyInstruction },
}

impl InvokableAction {
    pub fn text(command: impl Into<String>) -> Self {
        Self::TextOutput {
            command: command.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TextOutput { .. } => "text_output",
            Self::Gag { .. } => "gag",
            Self::Restraint { .. } => "restraint",
            Self::Restriction { .. } => "restriction",
            Self::Moodle { .. } => "moodle",
            Self::ShockCollar { .. } => "shock_collar",
            Self::SexToy { .. } => "sex_toy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_with_tag() {
        let action = InvokableAction::Gag {
            gag: GagRef::gag("Ball Gag"),
            new_state: NewState::Enabled,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "gag");
        assert_eq!(json["new_state"], "enabled");

        let back: InvokableAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }
}
