//! Payloads forwarded to haptic devices and the mood-effect collaborator

use serde::{Deserialize, Serialize};

use super::{MoodlePresetId, MoodleStatusId};

/// Operation a shock collar should perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockOpCode {
    Shock,
    Vibrate,
    Beep,
}

/// Instruction sent to a remote shock collar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShockInstruction {
    pub op_code: ShockOpCode,
    /// 0-100
    pub intensity: u8,
    pub duration_ms: u32,
}

impl ShockInstruction {
    pub fn new(op_code: ShockOpCode, intensity: u8, duration_ms: u32) -> Self {
        Self {
            op_code,
            intensity: intensity.min(100),
            duration_ms,
        }
    }
}

/// Credential for the remote shock-collar service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShockCredential {
    pub api_key: String,
    pub share_code: String,
}

impl ShockCredential {
    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.share_code.trim().is_empty()
    }
}

/// Motor a toy instruction drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToyMotor {
    Vibration,
    Rotation,
}

/// Instruction sent to connected toys through the device bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToyInstruction {
    pub motor: ToyMotor,
    /// 0.0-1.0
    pub intensity: f64,
    pub duration_ms: u32,
}

impl ToyInstruction {
    pub fn new(motor: ToyMotor, intensity: f64, duration_ms: u32) -> Self {
        Self {
            motor,
            intensity: intensity.clamp(0.0, 1.0),
            duration_ms,
        }
    }
}

/// Status or preset from the mood-effect catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum MoodleRef {
    Status(MoodleStatusId),
    Preset(MoodlePresetId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_values_are_clamped() {
        assert_eq!(ShockInstruction::new(ShockOpCode::Shock, 250, 500).intensity, 100);
        assert_eq!(ToyInstruction::new(ToyMotor::Rotation, 3.5, 100).intensity, 1.0);
    }

    #[test]
    fn test_credential_validity() {
        let blank = ShockCredential {
            api_key: " ".to_string(),
            share_code: "ABC".to_string(),
        };
        assert!(!blank.is_valid());

        let ok = ShockCredential {
            api_key: "key".to_string(),
            share_code: "ABC".to_string(),
        };
        assert!(ok.is_valid());
    }
}
