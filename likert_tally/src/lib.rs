mod config;
mod loader;
pub mod manual;
mod pipeline;

use log::debug;
use snafu::prelude::*;

pub use crate::config::*;
pub use crate::loader::load;
pub use crate::pipeline::*;

/// Turns a respondent-major matrix into a question-major one.
///
/// Arguments:
/// * `matrix` one row per respondent
/// * `question_count` the expected length of every row. It also fixes the number of
/// rows of the output when there are no respondents at all.
///
/// The output satisfies `output[q][r] == matrix[r][q]`. A row of the wrong length is
/// an error, the input is never padded or cut.
pub fn transpose(
    matrix: &[Vec<CellValue>],
    question_count: usize,
) -> Result<QuestionMatrix, TallyError> {
    let mut res: QuestionMatrix = vec![Vec::with_capacity(matrix.len()); question_count];
    for (respondent, row) in matrix.iter().enumerate() {
        ensure!(
            row.len() == question_count,
            ShapeMismatchSnafu {
                respondent,
                expected: question_count,
                actual: row.len(),
            }
        );
        for (question_row, value) in res.iter_mut().zip(row.iter()) {
            question_row.push(*value);
        }
    }
    debug!(
        "transpose: {} respondents x {} questions",
        matrix.len(),
        question_count
    );
    Ok(res)
}

/// Counts the answers to one question.
///
/// Blank answers ([NO_ANSWER]) are skipped. Any other value outside of `range` is an
/// error: nothing is clamped or dropped.
pub fn tally(responses: &[CellValue], range: &AnswerRange) -> Result<Histogram, TallyError> {
    let mut hist = Histogram::empty(range);
    for (respondent, value) in responses.iter().enumerate() {
        if *value == NO_ANSWER {
            continue;
        }
        ensure!(
            range.contains(*value),
            OutOfRangeSnafu {
                value: *value,
                respondent,
                question: None,
                min: range.min(),
                max: range.max(),
            }
        );
        hist.counts[(*value - range.min()) as usize] += 1;
    }
    Ok(hist)
}
