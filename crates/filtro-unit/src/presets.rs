//! Factory and user presets.
//!
//! Factory presets are fixed (cutoff, resonance) pairs addressed by number.
//! User presets are named [`ParameterState`] snapshots; the unit can build
//! and apply them, and they serialize to JSON for whatever storage the host
//! uses.

use serde::{Deserialize, Serialize};

use crate::error::UnitError;
use crate::shared::ParameterState;

/// A built-in preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactoryPreset {
    /// Preset number (index into [`FACTORY_PRESETS`]).
    pub number: usize,
    /// Display name.
    pub name: &'static str,
    /// Cutoff in Hz.
    pub cutoff: f32,
    /// Resonance (Q).
    pub resonance: f32,
}

/// Built-in presets, in number order.
pub const FACTORY_PRESETS: [FactoryPreset; 3] = [
    FactoryPreset {
        number: 0,
        name: "Prominent",
        cutoff: 2500.0,
        resonance: 5.0,
    },
    FactoryPreset {
        number: 1,
        name: "Bright",
        cutoff: 14000.0,
        resonance: 12.0,
    },
    FactoryPreset {
        number: 2,
        name: "Warm",
        cutoff: 384.0,
        resonance: 0.5,
    },
];

/// Look up a factory preset by number.
pub fn factory_preset(number: usize) -> Option<&'static FactoryPreset> {
    FACTORY_PRESETS.get(number)
}

/// A named snapshot saved by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreset {
    /// Display name.
    pub name: String,
    /// Parameter values keyed by string id.
    pub state: ParameterState,
}

impl UserPreset {
    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, UnitError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, UnitError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// The preset most recently applied.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentPreset {
    /// A factory preset.
    Factory(FactoryPreset),
    /// A user preset, by name.
    User(String),
}

impl CurrentPreset {
    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            CurrentPreset::Factory(preset) => preset.name,
            CurrentPreset::User(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_numbers_match_positions() {
        for (index, preset) in FACTORY_PRESETS.iter().enumerate() {
            assert_eq!(preset.number, index);
            assert_eq!(factory_preset(index), Some(preset));
        }
        assert!(factory_preset(FACTORY_PRESETS.len()).is_none());
    }

    #[test]
    fn user_preset_json_roundtrip() {
        let mut state = ParameterState::new();
        state.insert("cutoff".to_owned(), 880.0);
        state.insert("resonance".to_owned(), 3.5);
        let preset = UserPreset {
            name: "Telephone".to_owned(),
            state,
        };
        let bytes = preset.to_json().unwrap();
        assert_eq!(UserPreset::from_json(&bytes).unwrap(), preset);
    }

    #[test]
    fn invalid_user_preset_json_is_an_error() {
        let err = UserPreset::from_json(b"{\"name\": 3}").unwrap_err();
        assert!(matches!(err, UnitError::State(_)));
    }

    #[test]
    fn current_preset_names() {
        assert_eq!(CurrentPreset::Factory(FACTORY_PRESETS[1]).name(), "Bright");
        assert_eq!(CurrentPreset::User("Mine".to_owned()).name(), "Mine");
    }
}
