//! Word records and the in-memory word table

use serde::{Deserialize, Serialize};

/// One vocabulary entry from the uploaded list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordRecord {
    pub term: String,
    pub meaning: String,
    /// Sentence that should contain `term` verbatim
    pub example: String,
    pub translation: String,
}

impl WordRecord {
    pub fn new(
        term: impl Into<String>,
        meaning: impl Into<String>,
        example: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            term: term.into(),
            meaning: meaning.into(),
            example: example.into(),
            translation: translation.into(),
        }
    }
}

/// Ordered, read-only list of words loaded for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordTable {
    records: Vec<WordRecord>,
}

impl WordTable {
    pub fn new(records: Vec<WordRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[WordRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with exact duplicates removed, first occurrence kept
    pub fn distinct_records(&self) -> Vec<WordRecord> {
        let mut distinct: Vec<WordRecord> = Vec::with_capacity(self.records.len());
        for record in &self.records {
            if !distinct.contains(record) {
                distinct.push(record.clone());
            }
        }
        distinct
    }
}

impl From<Vec<WordRecord>> for WordTable {
    fn from(records: Vec<WordRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a WordTable {
    type Item = &'a WordRecord;
    type IntoIter = std::slice::Iter<'a, WordRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
