//! Error type shared by the loader, sampler and session

use thiserror::Error;

use crate::session::Phase;

#[derive(Error, Debug)]
pub enum TangoError {
    #[error("Missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Not enough words to build a question (need {needed}, have {available})")]
    InsufficientData { needed: usize, available: usize },

    #[error("Unsupported file format: .{0}")]
    UnsupportedFileType(String),

    #[error("Unknown quiz mode: {0}")]
    UnknownMode(String),

    #[error("Cannot {action} while in the {phase:?} phase")]
    InvalidPhase { action: &'static str, phase: Phase },

    #[error("Option {index} is out of range (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("'{0}' is not one of the options")]
    UnknownOption(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Excel(Box<calamine::Error>),

    #[error("Excel file has no sheets")]
    EmptyWorkbook,

    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<std::io::Error> for TangoError {
    fn from(error: std::io::Error) -> Self {
        TangoError::Io(Box::new(error))
    }
}

impl From<calamine::Error> for TangoError {
    fn from(error: calamine::Error) -> Self {
        TangoError::Excel(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, TangoError>;
