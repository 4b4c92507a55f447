//! Service configuration.
//!
//! One TOML file configures the whole stack: engine rules under `[engine.*]`,
//! the SQLite store under `[persistence]`, and service knobs under
//! `[service]`. Every field has a default, so an empty file is valid.
//!
//! ```toml
//! [service]
//! min_verification_confidence = 0.6
//! db_path = "ecomon.db"
//! log_level = "info,ecomon_core=debug"
//!
//! [engine.memory]
//! capacity = 50
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ecomon_core::config::PersistenceConfig;
use ecomon_core::EngineConfig;
use ecomon_llm::QuizDifficulty;

use crate::error::{Result, ServiceError};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Engine rules.
    #[serde(default)]
    pub engine: EngineConfig,
    /// SQLite store settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Service knobs.
    #[serde(default)]
    pub service: ServiceSettings,
}

impl ServiceConfig {
    /// Load from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `ServiceError::Config` or the engine's validation error.
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        let s = &self.service;
        if !(0.0..=1.0).contains(&s.min_verification_confidence) {
            return Err(ServiceError::Config(format!(
                "min_verification_confidence {} outside [0, 1]",
                s.min_verification_confidence
            )));
        }
        if s.quiz_size == 0 || s.quiz_size > MAX_QUIZ_SIZE {
            return Err(ServiceError::Config(format!(
                "quiz_size {} outside 1..={MAX_QUIZ_SIZE}",
                s.quiz_size
            )));
        }
        Ok(())
    }
}

/// Largest quiz the service will request.
pub const MAX_QUIZ_SIZE: usize = 20;

/// Service-level knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Verifications below this confidence produce no event.
    #[serde(default = "default_min_confidence")]
    pub min_verification_confidence: f64,
    /// Questions per quiz.
    #[serde(default = "default_quiz_size")]
    pub quiz_size: usize,
    /// Default quiz difficulty.
    #[serde(default)]
    pub quiz_difficulty: QuizDifficulty,
    /// SQLite database path. `None` keeps accounts in memory only.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// `tracing` filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines.
    #[serde(default)]
    pub log_json: bool,
    /// Mint achievements as they are earned.
    #[serde(default = "default_true")]
    pub mint_enabled: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            min_verification_confidence: default_min_confidence(),
            quiz_size: default_quiz_size(),
            quiz_difficulty: QuizDifficulty::default(),
            db_path: None,
            log_level: default_log_level(),
            log_json: false,
            mint_enabled: true,
        }
    }
}

fn default_min_confidence() -> f64 { 0.5 }
fn default_quiz_size() -> usize { 5 }
fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ServiceConfig::from_toml("").expect("valid");
        assert_eq!(config, ServiceConfig::default());
        assert!((config.service.min_verification_confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.service.quiz_size, 5);
        assert!(config.service.db_path.is_none());
    }

    #[test]
    fn nested_sections_parse() {
        let config = ServiceConfig::from_toml(
            r#"
            [service]
            min_verification_confidence = 0.7
            quiz_size = 3
            quiz_difficulty = "hard"
            db_path = "/tmp/ecomon.db"

            [engine.memory]
            capacity = 10

            [persistence]
            backup_count = 1
            "#,
        )
        .expect("valid");
        assert_eq!(config.service.quiz_size, 3);
        assert_eq!(config.service.quiz_difficulty, QuizDifficulty::Hard);
        assert_eq!(config.engine.memory.capacity, 10);
        assert_eq!(config.persistence.backup_count, 1);
        assert!(config.persistence.wal_mode);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(ServiceConfig::from_toml("[service]\nmin_verification_confidence = 1.5").is_err());
        assert!(ServiceConfig::from_toml("[service]\nquiz_size = 0").is_err());
        assert!(ServiceConfig::from_toml("[service]\nquiz_size = 50").is_err());
        assert!(ServiceConfig::from_toml("[service\n").is_err());
    }
}
