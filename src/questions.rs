//! Four-choice question generation for the vocabulary quiz

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{DistractorExclusion, OptionOrder, QuizConfig};
use crate::error::{Result, TangoError};
use crate::word::{WordRecord, WordTable};

/// Number of options shown for every question
pub const OPTION_COUNT: usize = 4;
const DISTRACTOR_COUNT: usize = OPTION_COUNT - 1;

/// Quiz format, chosen at the menu and fixed until the next menu visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    MeaningToWord,
    WordToMeaning,
    ClozeWithTranslationToWord,
    ClozeToWord,
}

impl QuizMode {
    pub const ALL: [QuizMode; 4] = [
        QuizMode::MeaningToWord,
        QuizMode::WordToMeaning,
        QuizMode::ClozeWithTranslationToWord,
        QuizMode::ClozeToWord,
    ];

    /// Field the user has to pick
    pub fn answer_dimension(self) -> AnswerDimension {
        match self {
            QuizMode::WordToMeaning => AnswerDimension::Meaning,
            _ => AnswerDimension::Word,
        }
    }

    /// Menu label, also written to the history export
    pub fn label(self) -> &'static str {
        match self {
            QuizMode::MeaningToWord => "意味→単語",
            QuizMode::WordToMeaning => "単語→意味",
            QuizMode::ClozeWithTranslationToWord => "空所英文＋和訳→単語",
            QuizMode::ClozeToWord => "空所英文→単語",
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            QuizMode::MeaningToWord => "meaning_to_word",
            QuizMode::WordToMeaning => "word_to_meaning",
            QuizMode::ClozeWithTranslationToWord => "cloze_with_translation_to_word",
            QuizMode::ClozeToWord => "cloze_to_word",
        }
    }

    pub fn is_cloze(self) -> bool {
        matches!(
            self,
            QuizMode::ClozeWithTranslationToWord | QuizMode::ClozeToWord
        )
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuizMode {
    type Err = TangoError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        QuizMode::ALL
            .into_iter()
            .find(|mode| mode.label() == s || mode.id() == s)
            .ok_or_else(|| TangoError::UnknownMode(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerDimension {
    Word,
    Meaning,
}

impl AnswerDimension {
    /// The value of this dimension on a record
    pub fn value(self, record: &WordRecord) -> &str {
        match self {
            AnswerDimension::Word => &record.term,
            AnswerDimension::Meaning => &record.meaning,
        }
    }

    /// The value of the other dimension, used as the plain prompt
    pub fn opposite_value(self, record: &WordRecord) -> &str {
        match self {
            AnswerDimension::Word => &record.meaning,
            AnswerDimension::Meaning => &record.term,
        }
    }
}

/// A drawn question. Built once per draw and never reshuffled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub record: WordRecord,
    pub mode: QuizMode,
    pub dimension: AnswerDimension,
    /// Meaning, term or cloze sentence depending on the mode
    pub prompt: String,
    /// Translation shown under the cloze sentence
    pub hint: Option<String>,
    pub correct_option: String,
    pub options: [String; OPTION_COUNT],
}

impl Question {
    /// Build the question for `target` under `mode`
    pub fn for_mode<R: Rng + ?Sized>(
        mode: QuizMode,
        target: &WordRecord,
        table: &WordTable,
        config: &QuizConfig,
        rng: &mut R,
    ) -> Result<Question> {
        let mut question = sample(
            target,
            mode.answer_dimension(),
            table,
            config.distractor_exclusion,
            config.option_order,
            rng,
        )?;
        question.mode = mode;

        if mode.is_cloze() {
            question.prompt = mask_term(&target.example, &target.term, &config.blank_placeholder);
        }
        if mode == QuizMode::ClozeWithTranslationToWord {
            question.hint = Some(target.translation.clone());
        }
        Ok(question)
    }

    /// Position of the correct answer in `options`
    pub fn correct_index(&self) -> usize {
        self.options
            .iter()
            .position(|o| *o == self.correct_option)
            .unwrap_or(OPTION_COUNT - 1)
    }

    pub fn is_correct(&self, index: usize) -> Result<bool> {
        let chosen = self.options.get(index).ok_or(TangoError::OptionOutOfRange {
            index,
            len: OPTION_COUNT,
        })?;
        Ok(*chosen == self.correct_option)
    }
}

/// Blank out every literal occurrence of `term`; sentences without it are
/// returned unchanged.
pub fn mask_term(example: &str, term: &str, placeholder: &str) -> String {
    if term.is_empty() || !example.contains(term) {
        return example.to_string();
    }
    example.replace(term, placeholder)
}

/// Build a four-option answer set for `target` along `dimension`.
///
/// Three distractors are drawn from the other records. When fewer than three
/// distinct distractor values exist they are drawn with replacement, so the
/// option text may repeat; the correct value never does.
pub fn sample<R: Rng + ?Sized>(
    target: &WordRecord,
    dimension: AnswerDimension,
    table: &WordTable,
    exclusion: DistractorExclusion,
    order: OptionOrder,
    rng: &mut R,
) -> Result<Question> {
    if table.len() < 2 {
        return Err(TangoError::InsufficientData {
            needed: 2,
            available: table.len(),
        });
    }

    let correct_option = dimension.value(target).to_string();

    let pool: Vec<&str> = table
        .iter()
        .filter(|w| match exclusion {
            DistractorExclusion::Record => *w != target,
            DistractorExclusion::OppositeField => {
                dimension.opposite_value(w) != dimension.opposite_value(target)
            }
        })
        .map(|w| dimension.value(w))
        .filter(|v| *v != correct_option)
        .collect();

    if pool.is_empty() {
        return Err(TangoError::InsufficientData {
            needed: 2,
            available: 1,
        });
    }

    let mut distinct: Vec<&str> = Vec::with_capacity(pool.len());
    for value in &pool {
        if !distinct.contains(value) {
            distinct.push(value);
        }
    }

    let distractors: [String; DISTRACTOR_COUNT] = if distinct.len() >= DISTRACTOR_COUNT {
        let picked: Vec<&str> = distinct
            .choose_multiple(rng, DISTRACTOR_COUNT)
            .copied()
            .collect();
        std::array::from_fn(|i| picked[i].to_string())
    } else {
        log::debug!(
            "Only {} distinct distractor(s) for '{}', sampling with replacement",
            distinct.len(),
            target.term
        );
        std::array::from_fn(|_| pool[rng.gen_range(0..pool.len())].to_string())
    };

    let [a, b, c] = distractors;
    let mut options = [a, b, c, correct_option.clone()];
    match order {
        OptionOrder::Shuffle => options.shuffle(rng),
        OptionOrder::CorrectLast => options[..DISTRACTOR_COUNT].shuffle(rng),
    }

    Ok(Question {
        record: target.clone(),
        mode: match dimension {
            AnswerDimension::Word => QuizMode::MeaningToWord,
            AnswerDimension::Meaning => QuizMode::WordToMeaning,
        },
        dimension,
        prompt: dimension.opposite_value(target).to_string(),
        hint: None,
        correct_option,
        options,
    })
}
