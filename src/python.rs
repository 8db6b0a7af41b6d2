//! Python bindings for the quiz front end

use chrono::{Local, NaiveDateTime};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::config::QuizConfig;
use crate::error::TangoError;
use crate::history::AttemptStats;
use crate::loader;
use crate::questions::{Question, QuizMode};
use crate::session::{Phase, QuizSession};
use crate::word::WordTable;

fn to_py_err(e: TangoError) -> PyErr {
    match e {
        TangoError::Schema { .. }
        | TangoError::UnknownMode(_)
        | TangoError::OptionOutOfRange { .. }
        | TangoError::UnknownOption(_)
        | TangoError::InsufficientData { .. }
        | TangoError::UnsupportedFileType(_) => PyValueError::new_err(e.to_string()),
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn parse_config(config_json: Option<&str>) -> PyResult<QuizConfig> {
    config_json
        .map(QuizConfig::from_json_str)
        .transpose()
        .map(Option::unwrap_or_default)
        .map_err(to_py_err)
}

/// Question as seen by the UI
#[pyclass(name = "Question")]
#[derive(Debug, Clone)]
pub struct PyQuestion {
    #[pyo3(get)]
    pub term: String,
    #[pyo3(get)]
    pub mode: String,
    #[pyo3(get)]
    pub prompt: String,
    #[pyo3(get)]
    pub hint: Option<String>,
    #[pyo3(get)]
    pub options: Vec<String>,
    #[pyo3(get)]
    pub correct_index: usize,
    #[pyo3(get)]
    pub correct_answer: String,
}

impl From<&Question> for PyQuestion {
    fn from(q: &Question) -> Self {
        Self {
            term: q.record.term.clone(),
            mode: q.mode.label().to_string(),
            prompt: q.prompt.clone(),
            hint: q.hint.clone(),
            options: q.options.to_vec(),
            correct_index: q.correct_index(),
            correct_answer: q.correct_option.clone(),
        }
    }
}

#[pymethods]
impl PyQuestion {
    fn __repr__(&self) -> String {
        format!(
            "Question(mode='{}', prompt='{}...')",
            self.mode,
            &self.prompt.chars().take(40).collect::<String>()
        )
    }
}

#[pymethods]
impl AttemptStats {
    fn __repr__(&self) -> String {
        format!(
            "AttemptStats(total={}, correct={}, accuracy={:.1}%)",
            self.total_attempts, self.correct_count, self.accuracy_percent
        )
    }
}

#[pyclass(name = "QuizSession")]
pub struct PyQuizSession {
    inner: QuizSession,
}

#[pymethods]
impl PyQuizSession {
    #[new]
    #[pyo3(signature = (path, config_json=None))]
    fn new(path: &str, config_json: Option<&str>) -> PyResult<Self> {
        let table = loader::load_file(path).map_err(to_py_err)?;
        Self::from_table(table, config_json)
    }

    /// Build a session from the raw bytes of an uploaded CSV file
    #[staticmethod]
    #[pyo3(signature = (data, config_json=None))]
    fn from_csv_bytes(data: &[u8], config_json: Option<&str>) -> PyResult<Self> {
        let table = loader::load_csv_bytes(data).map_err(to_py_err)?;
        Self::from_table(table, config_json)
    }

    #[getter]
    fn phase(&self) -> &'static str {
        match self.inner.phase() {
            Phase::Menu => "menu",
            Phase::Quiz => "quiz",
            Phase::Feedback => "feedback",
            Phase::Done => "done",
            Phase::Finished => "finished",
        }
    }

    #[getter]
    fn remaining(&self) -> usize {
        self.inner.remaining().len()
    }

    #[staticmethod]
    fn modes() -> Vec<&'static str> {
        QuizMode::ALL.iter().map(|m| m.label()).collect()
    }

    fn start(&mut self, mode: &str) -> PyResult<()> {
        let mode: QuizMode = mode.parse().map_err(to_py_err)?;
        self.inner.start(mode, now()).map_err(to_py_err)
    }

    fn question(&self) -> Option<PyQuestion> {
        self.inner.question().map(PyQuestion::from)
    }

    /// Returns True when the chosen option was correct
    fn answer(&mut self, index: usize) -> PyResult<bool> {
        self.inner
            .answer(index, now())
            .map(|outcome| outcome == crate::history::Outcome::Correct)
            .map_err(to_py_err)
    }

    /// (correct, term, correct option) for the last answer
    fn feedback(&self) -> Option<(bool, String, String)> {
        self.inner.last_feedback().map(|f| {
            (
                f.outcome == crate::history::Outcome::Correct,
                f.term.clone(),
                f.correct_option.clone(),
            )
        })
    }

    fn next(&mut self) -> PyResult<()> {
        self.inner.next(now()).map_err(to_py_err)
    }

    fn tick(&mut self) -> PyResult<bool> {
        self.inner.tick(now()).map_err(to_py_err)
    }

    fn restart(&mut self) -> PyResult<()> {
        self.inner.restart(now()).map_err(to_py_err)
    }

    fn finish(&mut self) -> PyResult<()> {
        self.inner.finish(now()).map_err(to_py_err)
    }

    fn reset(&mut self) {
        self.inner.reset(now());
    }

    fn load_table(&mut self, path: &str) -> PyResult<()> {
        let table = loader::load_file(path).map_err(to_py_err)?;
        self.inner.load_table(table, now()).map_err(to_py_err)
    }

    fn stats(&self) -> AttemptStats {
        self.inner.history().stats()
    }

    /// (term, fail count) pairs, most-missed first
    #[pyo3(signature = (limit=None))]
    fn failed_terms(&self, limit: Option<usize>) -> Vec<(String, usize)> {
        self.inner.history().failed_terms(limit)
    }

    fn elapsed_text(&self) -> String {
        self.inner.elapsed_text(now())
    }

    fn set_output_name(&mut self, name: &str) {
        self.inner.set_output_name(name);
    }

    /// (filename, bytes), or None until an output name is set
    fn export<'py>(&self, py: Python<'py>) -> PyResult<Option<(String, Bound<'py, PyBytes>)>> {
        let export = self.inner.export(now()).map_err(to_py_err)?;
        Ok(export.map(|e| (e.filename, PyBytes::new(py, &e.blob))))
    }

    fn __repr__(&self) -> String {
        format!(
            "QuizSession(phase='{}', remaining={}, answered={})",
            self.phase(),
            self.inner.remaining().len(),
            self.inner.history().len()
        )
    }
}

impl PyQuizSession {
    fn from_table(table: WordTable, config_json: Option<&str>) -> PyResult<Self> {
        let config = parse_config(config_json)?;
        let inner = QuizSession::new(table, config, now()).map_err(to_py_err)?;
        Ok(Self { inner })
    }
}

/// Validate a word list file and return its word count
#[pyfunction]
#[pyo3(name = "load_table")]
pub fn py_load_table(path: &str) -> PyResult<usize> {
    loader::load_file(path)
        .map(|table| table.len())
        .map_err(to_py_err)
}

/// Tango Core Python Module
#[pymodule]
fn tango_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_load_table, m)?)?;
    m.add_class::<PyQuizSession>()?;
    m.add_class::<PyQuestion>()?;
    m.add_class::<AttemptStats>()?;
    Ok(())
}
