//! Agent profiles
//!
//! An [`AgentProfile`] aggregates every tuning knob for one agent kind and
//! round-trips through RON (Rusty Object Notation) or JSON, so designers
//! edit profiles as data files rather than code.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::{BehaviorConfig, LocomotionConfig, PerceptionConfig};
use crate::world::{AiPolicy, DamageResponse};

/// Full tuning for one agent kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Profile name, for logs and tooling
    pub name: String,
    pub max_health: f32,
    pub ai_policy: AiPolicy,
    pub damage_response: DamageResponse,
    pub behavior: BehaviorConfig,
    pub locomotion: LocomotionConfig,
    pub perception: PerceptionConfig,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: "agent".to_string(),
            max_health: 100.0,
            ai_policy: AiPolicy::Basic,
            damage_response: DamageResponse::Normal,
            behavior: BehaviorConfig::default(),
            locomotion: LocomotionConfig::default(),
            perception: PerceptionConfig::default(),
        }
    }
}

impl AgentProfile {
    /// Check the profile for values that would break the behavior core.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProfile`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |what: &str| Err(ConfigError::InvalidProfile(format!("{}: {what}", self.name)));

        if self.max_health <= 0.0 {
            return fail("max_health must be positive");
        }
        if self.locomotion.base_speed <= 0.0 {
            return fail("base_speed must be positive");
        }
        if self.behavior.idle_duration_min > self.behavior.idle_duration_max {
            return fail("idle duration bounds are inverted");
        }
        if self.behavior.idle_duration_min < 0.0 {
            return fail("idle duration must not be negative");
        }
        if self.behavior.damage_min > self.behavior.damage_max {
            return fail("damage bounds are inverted");
        }
        if self.behavior.damage_min < 0.0 {
            return fail("damage must not be negative");
        }
        Ok(())
    }

    /// Save the profile to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a profile from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, deserialization fails,
    /// or the loaded profile is invalid
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let profile: Self =
            ron::from_str(&content).map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Save the profile to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a profile from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, deserialization fails,
    /// or the loaded profile is invalid
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let profile: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }
}

/// Errors that can occur loading, saving, or validating a profile
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// A field value the behavior core cannot run with
    InvalidProfile(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::InvalidProfile(e) => write!(f, "Invalid profile: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
