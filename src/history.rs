//! Session history - answer log, statistics and CSV export

use std::collections::HashMap;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::questions::QuizMode;

/// UTF-8 byte order mark, so spreadsheet apps detect the encoding
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const EXPORT_HEADER: [&str; 7] = ["単語", "結果", "出題形式", "選択", "正答", "経過秒", "学習時間"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Correct => "正解",
            Outcome::Incorrect => "不正解",
        }
    }
}

/// One answered question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub term: String,
    pub mode: QuizMode,
    pub outcome: Outcome,
    pub chosen: String,
    pub expected: String,
    pub answered_at: NaiveDateTime,
    /// Seconds since the quiz run started
    pub elapsed_seconds: i64,
}

/// Answer statistics for a session
#[cfg_attr(feature = "python", pyo3::pyclass(get_all))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttemptStats {
    pub total_attempts: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub accuracy_percent: f64,
}

/// Downloadable history file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryExport {
    pub filename: String,
    pub blob: Vec<u8>,
}

/// Append-only answer log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRecorder {
    entries: Vec<HistoryEntry>,
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> AttemptStats {
        let total = self.entries.len();
        let correct = self
            .entries
            .iter()
            .filter(|e| e.outcome == Outcome::Correct)
            .count();
        let accuracy = if total > 0 {
            (correct as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        AttemptStats {
            total_attempts: total,
            correct_count: correct,
            incorrect_count: total - correct,
            accuracy_percent: accuracy,
        }
    }

    /// Terms answered incorrectly at least once, most-missed first
    pub fn failed_terms(&self, limit: Option<usize>) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.outcome == Outcome::Incorrect) {
            let count = counts.entry(&entry.term).or_insert(0);
            if *count == 0 {
                first_seen.push(&entry.term);
            }
            *count += 1;
        }

        let mut failed: Vec<(String, usize)> = first_seen
            .into_iter()
            .map(|term| (term.to_string(), counts[term]))
            .collect();
        // Stable sort keeps first-failure order among ties
        failed.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            failed.truncate(limit);
        }
        failed
    }

    /// Render the history as a UTF-8 (with BOM) CSV file
    pub fn export(
        &self,
        label: &str,
        elapsed: TimeDelta,
        now: NaiveDateTime,
        extension: &str,
    ) -> Result<HistoryExport> {
        let study_time = format_elapsed(elapsed);

        let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
        writer.write_record(EXPORT_HEADER)?;
        for entry in &self.entries {
            let elapsed_seconds = entry.elapsed_seconds.to_string();
            writer.write_record([
                entry.term.as_str(),
                entry.outcome.label(),
                entry.mode.label(),
                entry.chosen.as_str(),
                entry.expected.as_str(),
                elapsed_seconds.as_str(),
                study_time.as_str(),
            ])?;
        }
        let blob = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()))?;

        Ok(HistoryExport {
            filename: export_filename(label, now, extension),
            blob,
        })
    }
}

/// `"{minutes}分{seconds}秒"`, negative spans count as zero
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    format!("{}分{}秒", total / 60, total % 60)
}

/// `"{label}_{YYYYMMDD_HHMMSS}.{ext}"`
pub fn export_filename(label: &str, now: NaiveDateTime, extension: &str) -> String {
    format!("{}_{}.{}", label, now.format("%Y%m%d_%H%M%S"), extension)
}
