//! Loading study configuration (grading defaults, prompts, optional card bank) from TOML.
//!
//! See `StudyConfig` for the expected schema. Every section is optional.

use serde::Deserialize;
use tracing::{info, error};

use crate::grading::{GradingOptions, DEFAULT_KEY_WORD_MIN_MATCH, DEFAULT_MAX_DISTANCE, DEFAULT_MIN_SIMILARITY};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct StudyConfig {
  #[serde(default)]
  pub grading: GradingConfig,
  #[serde(default)]
  pub study: StudySettings,
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub cards: Vec<CardCfg>,
}

/// Service-wide grading defaults. Requests may override the first three.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
  pub max_distance: usize,
  pub min_similarity: f64,
  pub strict_mode: bool,
  pub key_word_min_match: f64,
}

impl Default for GradingConfig {
  fn default() -> Self {
    Self {
      max_distance: DEFAULT_MAX_DISTANCE,
      min_similarity: DEFAULT_MIN_SIMILARITY,
      strict_mode: false,
      key_word_min_match: DEFAULT_KEY_WORD_MIN_MATCH,
    }
  }
}

impl GradingConfig {
  /// First out-of-range ratio, as `(field, value)`. Both ratios must lie within `[0, 1]`.
  pub fn invalid_ratio(&self) -> Option<(&'static str, f64)> {
    [("min_similarity", self.min_similarity), ("key_word_min_match", self.key_word_min_match)]
      .into_iter()
      .find(|(_, v)| !(0.0..=1.0).contains(v))
  }

  pub fn options(&self) -> GradingOptions {
    GradingOptions {
      max_distance: self.max_distance,
      min_similarity: self.min_similarity,
      strict_mode: self.strict_mode,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StudySettings {
  /// Consecutive correct answers needed to master a card.
  pub mastery_streak: u32,
}

impl Default for StudySettings {
  fn default() -> Self { Self { mastery_streak: 2 } }
}

/// Card entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct CardCfg {
  #[serde(default)] pub id: Option<String>,
  pub deck: String,
  #[serde(default)] pub term: String,
  #[serde(default)] pub definition: String,
}

/// Prompts used by the completion client to explain a wrong answer.
/// Placeholders: `{term}`, `{expected}`, `{answer}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub explain_system: String,
  pub explain_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      explain_system: "You are a patient study coach. Explain mistakes in 1-2 short sentences. Do not lecture.".into(),
      explain_user_template: "Flashcard prompt: {term}\nExpected answer: {expected}\nLearner answered: {answer}\nExplain briefly what is wrong or missing in the learner's answer.".into(),
    }
  }
}

/// Parse and return the config at `path`. On any IO/parsing error, logs and returns None.
/// Out-of-range grading ratios are logged and replaced by the grading defaults.
pub fn load_study_config(path: &str) -> Option<StudyConfig> {
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<StudyConfig>(&s) {
      Ok(mut cfg) => {
        if let Some((field, value)) = cfg.grading.invalid_ratio() {
          error!(target: "studyhall_backend", %path, field, value, "Grading ratio outside [0, 1]; using default grading settings");
          cfg.grading = GradingConfig::default();
        }
        info!(target: "studyhall_backend", %path, cards = cfg.cards.len(), "Loaded study config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "studyhall_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "studyhall_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Load `StudyConfig` from STUDY_CONFIG_PATH, if set.
pub fn load_study_config_from_env() -> Option<StudyConfig> {
  let path = std::env::var("STUDY_CONFIG_PATH").ok()?;
  load_study_config(&path)
}
