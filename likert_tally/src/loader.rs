// Reading the delimited export into a response matrix.

use log::{debug, info, warn};
use snafu::prelude::*;

use crate::config::*;

// How the text of one answer cell reads, before the blank policy is applied.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Cell {
    Blank,
    Answer(CellValue),
    Unreadable,
}

fn classify(content: &str) -> Cell {
    let s = content.trim();
    if s.is_empty() {
        return Cell::Blank;
    }
    if let Ok(x) = s.parse::<CellValue>() {
        return Cell::Answer(x);
    }
    // Fractional answers ("3.0") are truncated toward zero.
    match s.parse::<f64>() {
        Ok(x) if x.is_finite() && x.abs() < CellValue::MAX as f64 => {
            Cell::Answer(x.trunc() as CellValue)
        }
        _ => Cell::Unreadable,
    }
}

/// Parses the full content of an export.
///
/// The first line is the header. In every line, the first column (timestamp) is
/// dropped and the last `comment_column_count` columns are moved to the comment
/// list. The same columns are dropped from the header, so that `headers[i]` always
/// labels the i-th answer of every row.
pub fn load(source: &str, schema: &Schema) -> Result<SurveyData, TallyError> {
    let mut records = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(schema.delimiter)
        .from_reader(source.as_bytes())
        .into_records();

    let header = match records.next() {
        Some(record) => record.context(CsvParseSnafu { lineno: 1usize })?,
        None => {
            warn!("load: no header line in the input");
            return EmptyInputSnafu {}.fail();
        }
    };

    let width = header.len();
    if width != schema.row_width() {
        warn!(
            "load: header has {} columns, schema expects {}",
            width,
            schema.row_width()
        );
        return ColumnCountSnafu {
            available: width,
            question_count: schema.question_count,
            comment_column_count: schema.comment_column_count,
        }
        .fail();
    }
    let first_comment_col = width - schema.comment_column_count;

    let headers: Vec<String> = header
        .iter()
        .take(first_comment_col)
        .skip(1)
        .map(|s| s.to_string())
        .collect();
    debug!("load: headers: {:?}", headers);

    let mut responses: ResponseMatrix = Vec::new();
    let mut comments: Vec<String> = Vec::new();
    for (idx, record_r) in records.enumerate() {
        let record = record_r.context(CsvParseSnafu { lineno: idx + 2 })?;
        // Quoted cells may span lines, trust the reader's count when it has one.
        let lineno = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        ensure!(
            record.len() == width,
            RowLengthSnafu {
                lineno,
                expected: width,
                actual: record.len(),
            }
        );

        let mut row: Vec<CellValue> = Vec::with_capacity(schema.question_count);
        for (col, content) in record.iter().enumerate().take(first_comment_col).skip(1) {
            let column = col + 1;
            let value = match (classify(content), schema.blank_policy) {
                (Cell::Answer(x), _) => x,
                (Cell::Blank, BlankPolicy::NoAnswer) => NO_ANSWER,
                (Cell::Blank, BlankPolicy::Reject) => {
                    warn!("load: blank cell at line {} column {}", lineno, column);
                    return BlankAnswerSnafu { lineno, column }.fail();
                }
                (Cell::Unreadable, _) => {
                    warn!("load: unreadable cell at line {} column {}", lineno, column);
                    return NotNumericSnafu {
                        lineno,
                        column,
                        content,
                    }
                    .fail();
                }
            };
            row.push(value);
        }
        debug!("load: lineno: {:?} row: {:?}", lineno, row);

        comments.extend(record.iter().skip(first_comment_col).map(|s| s.to_string()));
        responses.push(row);
    }

    info!(
        "load: {} respondents, {} questions, {} comments",
        responses.len(),
        headers.len(),
        comments.len()
    );
    Ok(SurveyData {
        responses,
        headers,
        comments,
    })
}
