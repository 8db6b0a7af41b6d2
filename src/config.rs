//! Quiz configuration, loadable from JSON

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where the correct answer goes in the option list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionOrder {
    /// Uniformly random permutation of all four options.
    #[default]
    Shuffle,
    /// Distractors shuffled, correct answer always in the last slot.
    CorrectLast,
}

/// Which records are kept out of the distractor pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistractorExclusion {
    /// Exclude only the target record itself (full-record equality).
    #[default]
    Record,
    /// Exclude every record sharing the target's value on the other field,
    /// e.g. all rows with the same term when asking for a meaning.
    OppositeField,
}

/// What happens to the history when the user plays again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryReset {
    #[default]
    KeepOnRestart,
    ClearOnRestart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Token that replaces the term in cloze prompts
    pub blank_placeholder: String,
    pub option_order: OptionOrder,
    pub distractor_exclusion: DistractorExclusion,
    pub history_reset: HistoryReset,
    /// Auto-advance from feedback to the next question after this many
    /// milliseconds. `None` waits for an explicit "next".
    pub feedback_delay_ms: Option<u64>,
    /// Tables with fewer distinct words still run, but options may repeat
    pub min_distinct_words: usize,
    pub export_extension: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            blank_placeholder: "____".to_string(),
            option_order: OptionOrder::default(),
            distractor_exclusion: DistractorExclusion::default(),
            history_reset: HistoryReset::default(),
            feedback_delay_ms: None,
            min_distinct_words: 4,
            export_extension: "csv".to_string(),
        }
    }
}

impl QuizConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn feedback_delay(&self) -> Option<Duration> {
        self.feedback_delay_ms.map(Duration::from_millis)
    }
}
