//! Quiz session state machine
//!
//! `Menu -> Quiz -> Feedback -> (Quiz | Done) -> (Menu | Finished)`.
//! Every user event is a method call; an event that does not fit the
//! current phase returns [`TangoError::InvalidPhase`] and changes nothing.

use chrono::{NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{HistoryReset, QuizConfig};
use crate::error::{Result, TangoError};
use crate::history::{format_elapsed, HistoryEntry, HistoryExport, HistoryRecorder, Outcome};
use crate::questions::{Question, QuizMode};
use crate::word::{WordRecord, WordTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Menu,
    Quiz,
    Feedback,
    Done,
    Finished,
}

/// Result of the last answer, shown during `Feedback`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub outcome: Outcome,
    pub term: String,
    pub chosen: String,
    pub correct_option: String,
    pub answered_at: NaiveDateTime,
}

/// One user's quiz over one loaded word table
#[derive(Debug)]
pub struct QuizSession<R: Rng = StdRng> {
    table: WordTable,
    config: QuizConfig,
    rng: R,
    phase: Phase,
    mode: Option<QuizMode>,
    remaining: Vec<WordRecord>,
    current: Option<Question>,
    last_feedback: Option<AnswerFeedback>,
    history: HistoryRecorder,
    start_time: NaiveDateTime,
    finished_at: Option<NaiveDateTime>,
    output_name: String,
}

impl QuizSession<StdRng> {
    pub fn new(table: WordTable, config: QuizConfig, now: NaiveDateTime) -> Result<Self> {
        Self::with_rng(table, config, StdRng::from_entropy(), now)
    }
}

impl<R: Rng> QuizSession<R> {
    /// Create a session in the `Menu` phase. Fails when the table cannot
    /// produce a single question.
    pub fn with_rng(table: WordTable, config: QuizConfig, rng: R, now: NaiveDateTime) -> Result<Self> {
        check_table(&table, &config)?;

        let remaining = table.distinct_records();
        log::info!("Quiz session ready with {} words", remaining.len());
        Ok(Self {
            table,
            config,
            rng,
            phase: Phase::Menu,
            mode: None,
            remaining,
            current: None,
            last_feedback: None,
            history: HistoryRecorder::new(),
            start_time: now,
            finished_at: None,
            output_name: String::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Option<QuizMode> {
        self.mode
    }

    pub fn table(&self) -> &WordTable {
        &self.table
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Words not yet answered correctly in this run
    pub fn remaining(&self) -> &[WordRecord] {
        &self.remaining
    }

    /// The fixed question for the current draw
    pub fn question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn last_feedback(&self) -> Option<&AnswerFeedback> {
        self.last_feedback.as_ref()
    }

    pub fn history(&self) -> &HistoryRecorder {
        &self.history
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn set_output_name(&mut self, name: impl Into<String>) {
        self.output_name = name.into().trim().to_string();
    }

    /// Time since the run started, frozen once the run is finished
    pub fn elapsed(&self, now: NaiveDateTime) -> TimeDelta {
        self.finished_at.unwrap_or(now) - self.start_time
    }

    pub fn elapsed_text(&self, now: NaiveDateTime) -> String {
        format_elapsed(self.elapsed(now))
    }

    /// Menu -> Quiz with the chosen mode
    pub fn start(&mut self, mode: QuizMode, now: NaiveDateTime) -> Result<()> {
        self.expect_phase(Phase::Menu, "start a quiz")?;
        let dimension = mode.answer_dimension();
        let mut answers: Vec<&str> = Vec::new();
        for record in &self.remaining {
            let value = dimension.value(record);
            if !answers.contains(&value) {
                answers.push(value);
            }
        }
        if answers.len() < 2 {
            return Err(TangoError::InsufficientData {
                needed: 2,
                available: answers.len(),
            });
        }
        log::info!("Starting quiz in mode {}", mode.id());
        self.draw_next(mode, now)
    }

    /// Quiz -> Feedback. Returns whether the chosen option was correct.
    pub fn answer(&mut self, index: usize, now: NaiveDateTime) -> Result<Outcome> {
        self.expect_phase(Phase::Quiz, "answer")?;
        let question = self.current.as_ref().ok_or(TangoError::InvalidPhase {
            action: "answer",
            phase: self.phase,
        })?;
        let outcome = if question.is_correct(index)? {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };
        let chosen = question.options[index].clone();
        let record = question.record.clone();
        let mode = question.mode;
        let correct_option = question.correct_option.clone();

        if outcome == Outcome::Correct {
            self.remaining.retain(|r| *r != record);
        }
        log::debug!(
            "Answered '{}' for '{}': {:?}, {} left",
            chosen,
            record.term,
            outcome,
            self.remaining.len()
        );

        self.history.append(HistoryEntry {
            term: record.term.clone(),
            mode,
            outcome,
            chosen: chosen.clone(),
            expected: correct_option.clone(),
            answered_at: now,
            elapsed_seconds: (now - self.start_time).num_seconds(),
        });
        self.last_feedback = Some(AnswerFeedback {
            outcome,
            term: record.term,
            chosen,
            correct_option,
            answered_at: now,
        });
        self.phase = Phase::Feedback;
        Ok(outcome)
    }

    /// Answer by option text instead of position
    pub fn answer_text(&mut self, text: &str, now: NaiveDateTime) -> Result<Outcome> {
        self.expect_phase(Phase::Quiz, "answer")?;
        let index = self
            .current
            .as_ref()
            .and_then(|q| q.options.iter().position(|o| o == text))
            .ok_or_else(|| TangoError::UnknownOption(text.to_string()))?;
        self.answer(index, now)
    }

    /// Feedback -> Quiz, or Done when every word has been answered correctly
    pub fn next(&mut self, now: NaiveDateTime) -> Result<()> {
        self.expect_phase(Phase::Feedback, "go to the next question")?;
        let mode = self.mode.ok_or(TangoError::InvalidPhase {
            action: "go to the next question",
            phase: self.phase,
        })?;
        self.draw_next(mode, now)
    }

    /// Advance out of `Feedback` once the configured delay has passed.
    /// Returns true when the session moved on.
    pub fn tick(&mut self, now: NaiveDateTime) -> Result<bool> {
        if !self.auto_advance_due(now) {
            return Ok(false);
        }
        self.next(now)?;
        Ok(true)
    }

    pub fn auto_advance_due(&self, now: NaiveDateTime) -> bool {
        let (Some(delay), Some(feedback)) = (self.config.feedback_delay(), &self.last_feedback) else {
            return false;
        };
        if self.phase != Phase::Feedback {
            return false;
        }
        match TimeDelta::from_std(delay) {
            Ok(delay) => now - feedback.answered_at >= delay,
            Err(_) => false,
        }
    }

    /// Done -> Menu with the pool refilled
    pub fn restart(&mut self, now: NaiveDateTime) -> Result<()> {
        self.expect_phase(Phase::Done, "restart")?;
        if self.config.history_reset == HistoryReset::ClearOnRestart {
            self.history.clear();
        }
        log::info!("Restarting quiz, {} answers kept in history", self.history.len());
        self.enter_menu(now);
        Ok(())
    }

    /// Done -> Finished, after which the history can be exported
    pub fn finish(&mut self, now: NaiveDateTime) -> Result<()> {
        self.expect_phase(Phase::Done, "finish")?;
        self.finished_at.get_or_insert(now);
        self.phase = Phase::Finished;
        log::info!(
            "Session finished after {} answers in {}",
            self.history.len(),
            self.elapsed_text(now)
        );
        Ok(())
    }

    /// Back to `Menu` from any phase, dropping the history
    pub fn reset(&mut self, now: NaiveDateTime) {
        self.history.clear();
        self.enter_menu(now);
    }

    /// Replace the word table (a fresh upload) and go back to `Menu`.
    /// On error the current session is left as it was.
    pub fn load_table(&mut self, table: WordTable, now: NaiveDateTime) -> Result<()> {
        check_table(&table, &self.config)?;
        log::info!("Loaded new word table with {} words", table.len());
        self.table = table;
        self.reset(now);
        Ok(())
    }

    /// Export the history. Only available once finished; yields `None`
    /// until a non-empty output name is set.
    pub fn export(&self, now: NaiveDateTime) -> Result<Option<HistoryExport>> {
        self.expect_phase(Phase::Finished, "export the history")?;
        if self.output_name.is_empty() {
            return Ok(None);
        }
        let export = self.history.export(
            &self.output_name,
            self.elapsed(now),
            now,
            &self.config.export_extension,
        )?;
        Ok(Some(export))
    }

    fn enter_menu(&mut self, now: NaiveDateTime) {
        self.remaining = self.table.distinct_records();
        self.current = None;
        self.last_feedback = None;
        self.mode = None;
        self.start_time = now;
        self.finished_at = None;
        self.phase = Phase::Menu;
    }

    /// Draw a word uniformly from the remaining pool and fix its question.
    /// Nothing changes when the question cannot be built.
    fn draw_next(&mut self, mode: QuizMode, now: NaiveDateTime) -> Result<()> {
        let Some(target) = self.remaining.choose(&mut self.rng).cloned() else {
            self.mode = Some(mode);
            self.current = None;
            self.last_feedback = None;
            self.phase = Phase::Done;
            log::info!("All words answered correctly in {}", self.elapsed_text(now));
            return Ok(());
        };

        let question = Question::for_mode(mode, &target, &self.table, &self.config, &mut self.rng)?;
        log::debug!("Drew '{}' ({} remaining)", target.term, self.remaining.len());
        self.mode = Some(mode);
        self.current = Some(question);
        self.last_feedback = None;
        self.phase = Phase::Quiz;
        Ok(())
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(TangoError::InvalidPhase {
                action,
                phase: self.phase,
            })
        }
    }
}

fn check_table(table: &WordTable, config: &QuizConfig) -> Result<()> {
    let distinct = table.distinct_records().len();
    if distinct < 2 {
        return Err(TangoError::InsufficientData {
            needed: 2,
            available: distinct,
        });
    }
    if distinct < config.min_distinct_words {
        log::warn!(
            "Only {} distinct words loaded (recommended at least {}); options may repeat",
            distinct,
            config.min_distinct_words
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + TimeDelta::seconds(secs)
    }

    fn animals() -> WordTable {
        WordTable::new(vec![
            WordRecord::new("cat", "猫", "I see a cat.", "猫を見る"),
            WordRecord::new("dog", "犬", "The dog runs.", "犬が走る"),
            WordRecord::new("bird", "鳥", "A bird sings.", "鳥が歌う"),
            WordRecord::new("fish", "魚", "The fish swims.", "魚が泳ぐ"),
        ])
    }

    fn session(config: QuizConfig) -> QuizSession<StdRng> {
        QuizSession::with_rng(animals(), config, StdRng::seed_from_u64(42), at(0)).unwrap()
    }

    fn wrong_index(session: &QuizSession<StdRng>) -> usize {
        let q = session.question().unwrap();
        (q.correct_index() + 1) % q.options.len()
    }

    #[test]
    fn answering_everything_correctly_reaches_done() {
        let mut s = session(QuizConfig::default());
        assert_eq!(s.phase(), Phase::Menu);
        s.start(QuizMode::WordToMeaning, at(0)).unwrap();

        for (i, expected_left) in [3, 2, 1, 0].into_iter().enumerate() {
            assert_eq!(s.phase(), Phase::Quiz);
            let idx = s.question().unwrap().correct_index();
            assert_eq!(s.answer(idx, at(i as i64 + 1)).unwrap(), Outcome::Correct);
            assert_eq!(s.phase(), Phase::Feedback);
            assert_eq!(s.remaining().len(), expected_left);
            s.next(at(i as i64 + 1)).unwrap();
        }

        assert_eq!(s.phase(), Phase::Done);
        assert!(s.question().is_none());
        assert_eq!(s.history().len(), 4);
        assert_eq!(s.elapsed(at(90)), TimeDelta::seconds(90));
    }

    #[test]
    fn wrong_answer_keeps_the_word_in_the_pool() {
        let mut s = session(QuizConfig::default());
        s.start(QuizMode::MeaningToWord, at(0)).unwrap();
        let term = s.question().unwrap().record.term.clone();

        let idx = wrong_index(&s);
        assert_eq!(s.answer(idx, at(5)).unwrap(), Outcome::Incorrect);
        assert_eq!(s.remaining().len(), 4);
        assert!(s.remaining().iter().any(|r| r.term == term));

        let feedback = s.last_feedback().unwrap();
        assert_eq!(feedback.term, term);
        assert_eq!(feedback.correct_option, term);
        assert_eq!(s.history().entries()[0].outcome, Outcome::Incorrect);
        assert_eq!(s.history().entries()[0].elapsed_seconds, 5);
    }

    #[test]
    fn question_is_fixed_until_answered() {
        let mut s = session(QuizConfig::default());
        s.start(QuizMode::ClozeToWord, at(0)).unwrap();
        let first = s.question().cloned().unwrap();
        assert_eq!(s.question(), Some(&first));
        assert!(!first.prompt.contains(&first.record.term));
    }

    #[test]
    fn events_in_the_wrong_phase_are_rejected() {
        let mut s = session(QuizConfig::default());
        assert!(matches!(
            s.answer(0, at(0)),
            Err(TangoError::InvalidPhase { phase: Phase::Menu, .. })
        ));
        assert!(s.next(at(0)).is_err());
        assert!(s.restart(at(0)).is_err());
        assert!(s.export(at(0)).is_err());

        s.start(QuizMode::WordToMeaning, at(0)).unwrap();
        assert!(s.start(QuizMode::WordToMeaning, at(0)).is_err());
        assert!(matches!(
            s.answer(9, at(1)),
            Err(TangoError::OptionOutOfRange { index: 9, .. })
        ));
        assert_eq!(s.phase(), Phase::Quiz);
        assert!(s.history().is_empty());
    }

    #[test]
    fn answer_text_matches_option() {
        let mut s = session(QuizConfig::default());
        s.start(QuizMode::WordToMeaning, at(0)).unwrap();

        let err = s.answer_text("象", at(1)).unwrap_err();
        assert!(matches!(&err, TangoError::UnknownOption(text) if text == "象"));
        assert_eq!(err.to_string(), "'象' is not one of the options");
        assert_eq!(s.phase(), Phase::Quiz);

        let correct = s.question().unwrap().correct_option.clone();
        assert_eq!(s.answer_text(&correct, at(1)).unwrap(), Outcome::Correct);
    }

    #[test]
    fn stats_track_the_session_answers() {
        let mut s = session(QuizConfig::default());
        s.start(QuizMode::MeaningToWord, at(0)).unwrap();
        let missed = s.question().unwrap().record.term.clone();
        let idx = wrong_index(&s);
        s.answer(idx, at(1)).unwrap();
        s.next(at(1)).unwrap();
        let idx = s.question().unwrap().correct_index();
        s.answer(idx, at(2)).unwrap();

        let stats = s.history().stats();
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.correct_count, 1);
        assert!((stats.accuracy_percent - 50.0).abs() < f64::EPSILON);
        assert_eq!(s.history().failed_terms(None), vec![(missed, 1)]);
        assert!(s.history().failed_terms(Some(0)).is_empty());
    }

    #[test]
    fn start_refuses_a_mode_whose_answers_are_all_the_same() {
        let table = WordTable::new(vec![
            WordRecord::new("cat", "猫", "I see a cat.", "猫を見る"),
            WordRecord::new("kitty", "猫", "Hello kitty.", "子猫"),
        ]);
        let mut s =
            QuizSession::with_rng(table, QuizConfig::default(), StdRng::seed_from_u64(1), at(0))
                .unwrap();

        assert!(matches!(
            s.start(QuizMode::WordToMeaning, at(0)),
            Err(TangoError::InsufficientData { needed: 2, available: 1 })
        ));
        assert_eq!(s.phase(), Phase::Menu);
        assert_eq!(s.mode(), None);
        assert!(s.question().is_none());

        // Terms differ, so asking for the word still works
        s.start(QuizMode::MeaningToWord, at(0)).unwrap();
        assert_eq!(s.mode(), Some(QuizMode::MeaningToWord));
        assert_eq!(s.phase(), Phase::Quiz);
    }

    #[test]
    fn failed_draw_leaves_the_menu_untouched() {
        let table = WordTable::new(vec![
            WordRecord::new("cat", "猫", "I see a cat.", "猫を見る"),
            WordRecord::new("cat", "ネコ", "A cat sleeps.", "猫が寝る"),
        ]);
        let config = QuizConfig {
            distractor_exclusion: crate::config::DistractorExclusion::OppositeField,
            ..QuizConfig::default()
        };
        let mut s = QuizSession::with_rng(table, config, StdRng::seed_from_u64(5), at(0)).unwrap();

        assert!(s.start(QuizMode::WordToMeaning, at(0)).is_err());
        assert_eq!(s.phase(), Phase::Menu);
        assert_eq!(s.mode(), None);
        assert_eq!(s.remaining().len(), 2);
    }

    fn finish_all(s: &mut QuizSession<StdRng>, mode: QuizMode, t: i64) {
        s.start(mode, at(t)).unwrap();
        while s.phase() == Phase::Quiz {
            let idx = s.question().unwrap().correct_index();
            s.answer(idx, at(t)).unwrap();
            s.next(at(t)).unwrap();
        }
        assert_eq!(s.phase(), Phase::Done);
    }

    #[test]
    fn history_survives_restart_by_default() {
        let mut s = session(QuizConfig::default());
        finish_all(&mut s, QuizMode::MeaningToWord, 0);
        s.restart(at(10)).unwrap();
        assert_eq!(s.phase(), Phase::Menu);
        assert_eq!(s.remaining().len(), 4);
        assert_eq!(s.mode(), None);
        assert_eq!(s.start_time(), at(10));
        assert_eq!(s.history().len(), 4);

        finish_all(&mut s, QuizMode::WordToMeaning, 20);
        assert_eq!(s.history().len(), 8);

        s.reset(at(30));
        assert!(s.history().is_empty());
    }

    #[test]
    fn history_cleared_on_restart_when_configured() {
        let config = QuizConfig {
            history_reset: HistoryReset::ClearOnRestart,
            ..QuizConfig::default()
        };
        let mut s = session(config);
        finish_all(&mut s, QuizMode::MeaningToWord, 0);
        s.restart(at(10)).unwrap();
        assert!(s.history().is_empty());
    }

    #[test]
    fn export_waits_for_a_name() {
        let mut s = session(QuizConfig::default());
        finish_all(&mut s, QuizMode::ClozeWithTranslationToWord, 0);
        s.finish(at(125)).unwrap();
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.export(at(130)).unwrap(), None);

        s.set_output_name("  ");
        assert_eq!(s.export(at(130)).unwrap(), None);

        s.set_output_name("Taro");
        let export = s.export(at(0)).unwrap().unwrap();
        assert_eq!(export.filename, "Taro_20250601_100000.csv");
        let text = String::from_utf8(export.blob).unwrap();
        assert!(text.contains("2分5秒"));
        // Exporting does not consume the history
        assert_eq!(s.history().len(), 4);
    }

    #[test]
    fn auto_advance_after_delay() {
        let config = QuizConfig {
            feedback_delay_ms: Some(1500),
            ..QuizConfig::default()
        };
        let mut s = session(config);
        s.start(QuizMode::WordToMeaning, at(0)).unwrap();
        assert!(!s.tick(at(10)).unwrap());

        let idx = wrong_index(&s);
        s.answer(idx, at(10)).unwrap();
        assert!(!s.tick(at(11)).unwrap());
        assert_eq!(s.phase(), Phase::Feedback);
        assert!(s.tick(at(12)).unwrap());
        assert_eq!(s.phase(), Phase::Quiz);
    }

    #[test]
    fn no_auto_advance_without_delay() {
        let mut s = session(QuizConfig::default());
        s.start(QuizMode::WordToMeaning, at(0)).unwrap();
        let idx = wrong_index(&s);
        s.answer(idx, at(0)).unwrap();
        assert!(!s.tick(at(3600)).unwrap());
    }

    #[test]
    fn tiny_tables_are_refused() {
        let one = WordTable::new(vec![WordRecord::new("cat", "猫", "a cat", "猫")]);
        assert!(matches!(
            QuizSession::new(one.clone(), QuizConfig::default(), at(0)),
            Err(TangoError::InsufficientData { available: 1, .. })
        ));

        let mut s = session(QuizConfig::default());
        s.start(QuizMode::MeaningToWord, at(0)).unwrap();
        assert!(s.load_table(one, at(1)).is_err());
        assert_eq!(s.phase(), Phase::Quiz);
    }

    #[test]
    fn duplicate_rows_count_once() {
        let mut records = animals().records().to_vec();
        records.push(records[0].clone());
        let mut s = session(QuizConfig::default());
        s.load_table(WordTable::new(records), at(0)).unwrap();
        assert_eq!(s.table().len(), 5);
        assert_eq!(s.remaining().len(), 4);
    }
}
