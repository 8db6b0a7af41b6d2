//! Word list import from CSV and Excel files

use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;

use crate::error::{Result, TangoError};
use crate::word::{WordRecord, WordTable};

/// Load a word list, picking the parser from the file extension
pub fn load_file(path: impl AsRef<Path>) -> Result<WordTable> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_csv_path(path),
        "xlsx" | "xls" | "xlsm" | "ods" => load_excel_path(path),
        _ => Err(TangoError::UnsupportedFileType(extension)),
    }
}

/// Column index mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMapping {
    term: usize,
    meaning: usize,
    example: usize,
    translation: usize,
}

/// Detect column indices from header names
fn detect_columns<S: AsRef<str>>(headers: &[S]) -> Result<ColumnMapping> {
    let mut term = None;
    let mut meaning = None;
    let mut example = None;
    let mut translation = None;

    for (i, header) in headers.iter().enumerate() {
        let name = header.as_ref().trim_start_matches('\u{feff}').trim().to_lowercase();
        let slot = match name.as_str() {
            "単語" | "word" | "term" | "vocabulary" => &mut term,
            "意味" | "meaning" | "definition" => &mut meaning,
            "例文" | "example" | "sentence" => &mut example,
            "和訳" | "translation" => &mut translation,
            _ => continue,
        };
        // First matching column wins
        slot.get_or_insert(i);
    }

    match (term, meaning, example, translation) {
        (Some(term), Some(meaning), Some(example), Some(translation)) => Ok(ColumnMapping {
            term,
            meaning,
            example,
            translation,
        }),
        _ => {
            let missing = [
                ("単語", term),
                ("意味", meaning),
                ("例文", example),
                ("和訳", translation),
            ]
            .iter()
            .filter(|(_, found)| found.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
            Err(TangoError::Schema { missing })
        }
    }
}

/// Build records from rows, skipping rows without a term
fn collect_records<I, R>(rows: I, mapping: ColumnMapping) -> Vec<WordRecord>
where
    I: IntoIterator<Item = R>,
    R: Fn(usize) -> String,
{
    let mut records = Vec::new();
    for (line, cell) in rows.into_iter().enumerate() {
        let term = cell(mapping.term);
        if term.is_empty() {
            log::warn!("Skipping row {}: empty term", line + 2);
            continue;
        }
        records.push(WordRecord {
            term,
            meaning: cell(mapping.meaning),
            example: cell(mapping.example),
            translation: cell(mapping.translation),
        });
    }
    records
}

/// Parse CSV from any reader (an uploaded file's bytes, a file on disk)
pub fn load_csv_reader<R: Read>(reader: R) -> Result<WordTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    let mapping = detect_columns(&headers)?;

    let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    let records = collect_records(
        rows.iter().map(|row| {
            move |i: usize| row.get(i).map(|s| s.trim().to_string()).unwrap_or_default()
        }),
        mapping,
    );

    log::info!("Loaded {} words from CSV", records.len());
    Ok(WordTable::new(records))
}

pub fn load_csv_bytes(bytes: &[u8]) -> Result<WordTable> {
    load_csv_reader(bytes)
}

pub fn load_csv_path(path: impl AsRef<Path>) -> Result<WordTable> {
    let file = std::fs::File::open(path)?;
    load_csv_reader(file)
}

/// Parse the first sheet of a workbook
pub fn load_excel_path(path: impl AsRef<Path>) -> Result<WordTable> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(TangoError::EmptyWorkbook)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(TangoError::Schema {
        missing: vec![
            "単語".to_string(),
            "意味".to_string(),
            "例文".to_string(),
            "和訳".to_string(),
        ],
    })?;
    let headers: Vec<String> = header_row.iter().map(get_cell_string).collect();
    let mapping = detect_columns(&headers)?;

    let records = collect_records(
        rows.map(|row| move |i: usize| row.get(i).map(get_cell_string).unwrap_or_default()),
        mapping,
    );

    log::info!("Loaded {} words from sheet '{}'", records.len(), sheet_name);
    Ok(WordTable::new(records))
}

/// Helper to extract string from Excel cell
fn get_cell_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
        Data::Empty => String::new(),
    }
}
