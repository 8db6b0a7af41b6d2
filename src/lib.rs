//! Tango Core - four-choice vocabulary quiz engine
//!
//! Loads a word list (term, meaning, example, translation), runs a quiz
//! session over it and exports the answer history as CSV. Build with the
//! `python` feature for the Python extension module.

mod config;
mod error;
mod history;
mod loader;
mod questions;
mod session;
mod word;

#[cfg(feature = "python")]
mod python;

pub use config::{DistractorExclusion, HistoryReset, OptionOrder, QuizConfig};
pub use error::{Result, TangoError};
pub use history::{
    export_filename, format_elapsed, AttemptStats, HistoryEntry, HistoryExport, HistoryRecorder,
    Outcome,
};
pub use loader::{load_csv_bytes, load_csv_path, load_csv_reader, load_excel_path, load_file};
pub use questions::{mask_term, sample, AnswerDimension, Question, QuizMode, OPTION_COUNT};
pub use session::{AnswerFeedback, Phase, QuizSession};
pub use word::{WordRecord, WordTable};
