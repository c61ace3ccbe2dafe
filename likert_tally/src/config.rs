// ********* Input data structures ***********

use std::ops::RangeInclusive;

use snafu::prelude::*;

/// A single answer, after the text of a cell has been coerced.
///
/// [NO_ANSWER] marks a blank cell. Any other value is expected to be in the
/// configured [AnswerRange]; this is only checked when tallying.
pub type CellValue = i64;

/// The sentinel for a blank answer. It is never counted in a histogram.
pub const NO_ANSWER: CellValue = 0;

/// Respondent-major grid: one row per respondent, one column per question.
pub type ResponseMatrix = Vec<Vec<CellValue>>;

/// Question-major grid: one row per question, one column per respondent.
pub type QuestionMatrix = Vec<Vec<CellValue>>;

/// The widest [AnswerRange] accepted, in number of distinct answers.
pub const MAX_ANSWER_COUNT: usize = 100;

/// The closed range of valid Likert answers.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct AnswerRange {
    min: CellValue,
    max: CellValue,
}

impl AnswerRange {
    /// The 1 to 5 scale used by most questionnaires.
    pub const FIVE_POINT: AnswerRange = AnswerRange { min: 1, max: 5 };

    pub fn new(min: CellValue, max: CellValue) -> Result<AnswerRange, TallyError> {
        // The lowest answer must stay above the blank sentinel.
        ensure!(
            min > NO_ANSWER,
            InvalidSchemaSnafu {
                reason: format!("the lowest answer must be at least 1, got {}", min),
            }
        );
        ensure!(
            min <= max,
            InvalidSchemaSnafu {
                reason: format!("empty answer range {}..={}", min, max),
            }
        );
        let width = usize::try_from(max - min).ok();
        ensure!(
            matches!(width, Some(w) if w < MAX_ANSWER_COUNT),
            InvalidSchemaSnafu {
                reason: format!(
                    "answer range {}..={} has more than {} answers",
                    min, max, MAX_ANSWER_COUNT
                ),
            }
        );
        Ok(AnswerRange { min, max })
    }

    pub fn min(&self) -> CellValue {
        self.min
    }

    pub fn max(&self) -> CellValue {
        self.max
    }

    /// The number of distinct answers, which is also the number of histogram buckets.
    /// Never more than [MAX_ANSWER_COUNT].
    pub fn answer_count(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    pub fn contains(&self, value: CellValue) -> bool {
        self.values().contains(&value)
    }

    pub fn values(&self) -> RangeInclusive<CellValue> {
        self.min..=self.max
    }
}

/// What to do with a blank answer cell.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BlankPolicy {
    /// A blank cell becomes [NO_ANSWER] and is left out of every count.
    NoAnswer,
    /// A blank cell is a malformed input.
    Reject,
}

/// The fixed shape of a survey export.
///
/// Each row of the export is laid out as: one timestamp column, then
/// `question_count` answer columns, then `comment_column_count` free-text columns.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Schema {
    pub question_count: usize,
    pub answer_range: AnswerRange,
    pub comment_column_count: usize,
    pub blank_policy: BlankPolicy,
    pub delimiter: u8,
}

impl Schema {
    pub fn new(
        question_count: usize,
        answer_range: AnswerRange,
        comment_column_count: usize,
    ) -> Result<Schema, TallyError> {
        ensure!(
            question_count > 0,
            InvalidSchemaSnafu {
                reason: "a survey needs at least one question".to_string(),
            }
        );
        Ok(Schema {
            question_count,
            answer_range,
            comment_column_count,
            blank_policy: BlankPolicy::NoAnswer,
            delimiter: b',',
        })
    }

    pub fn blank_policy(self, blank_policy: BlankPolicy) -> Schema {
        Schema {
            blank_policy,
            ..self
        }
    }

    pub fn delimiter(self, delimiter: u8) -> Schema {
        Schema { delimiter, ..self }
    }

    /// The number of columns every row of the export must have.
    pub fn row_width(&self) -> usize {
        1 + self.question_count + self.comment_column_count
    }
}

// ******** Output data structures *********

/// The parsed export, with the timestamp and comment columns set aside.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyData {
    pub responses: ResponseMatrix,
    /// One label per question, in column order.
    pub headers: Vec<String>,
    /// Respondent-major, then column order.
    pub comments: Vec<String>,
}

/// Count of answers for each value of an [AnswerRange].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Histogram {
    pub(crate) min_answer: CellValue,
    pub(crate) counts: Vec<u64>,
}

impl Histogram {
    pub fn empty(range: &AnswerRange) -> Histogram {
        Histogram {
            min_answer: range.min(),
            counts: vec![0; range.answer_count()],
        }
    }

    /// Index `k` counts the answers equal to `min_answer + k`.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().cloned().max().unwrap_or(0)
    }

    /// The pairs (answer, count), in increasing answer order.
    pub fn iter(&self) -> impl Iterator<Item = (CellValue, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(idx, c)| (self.min_answer + idx as CellValue, *c))
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionSummary {
    pub label: String,
    pub histogram: Histogram,
    pub blank_count: u64,
}

/// Everything needed to draw a report, computed before anything is drawn.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Tabulation {
    pub questions: Vec<QuestionSummary>,
    /// One block per respondent, in submission order.
    pub comments: Vec<Vec<String>>,
    pub respondent_count: usize,
}

impl Tabulation {
    /// The top of the y axis shared by all the charts of a report.
    pub fn y_axis_upper_bound(&self) -> u64 {
        let tallest = self
            .questions
            .iter()
            .map(|q| q.histogram.max_count())
            .max()
            .unwrap_or(0);
        (self.respondent_count as u64).max(tallest).max(1)
    }
}

// ********* Errors **********

/// The broad categories of [TallyError].
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorKind {
    /// The schema itself is not usable.
    InvalidSchema,
    /// Structural problems with the export.
    MalformedInput,
    /// A respondent row does not have one answer per question.
    ShapeMismatch,
    /// A non-blank answer is outside the answer range.
    OutOfRange,
}

/// Errors that stop a tabulation. None of them is recoverable.
///
/// Line numbers are 1-based and count the header line; columns are 1-based.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("invalid schema: {reason}"))]
    InvalidSchema { reason: String },

    #[snafu(display("the input is empty, a header line is required"))]
    EmptyInput {},

    #[snafu(display("could not read line {lineno} of the input"))]
    CsvParse { source: csv::Error, lineno: usize },

    #[snafu(display("line {lineno} has {actual} columns but the header has {expected}"))]
    RowLength {
        lineno: usize,
        expected: usize,
        actual: usize,
    },

    #[snafu(display(
        "the header has {available} columns, expected 1 timestamp + {question_count} questions + {comment_column_count} comments"
    ))]
    ColumnCount {
        available: usize,
        question_count: usize,
        comment_column_count: usize,
    },

    #[snafu(display("line {lineno}, column {column}: cannot read {content:?} as an answer"))]
    NotNumeric {
        lineno: usize,
        column: usize,
        content: String,
    },

    #[snafu(display("line {lineno}, column {column}: blank answers are not accepted"))]
    BlankAnswer { lineno: usize, column: usize },

    #[snafu(display(
        "respondent {} has {actual} answers, expected {expected}",
        respondent + 1
    ))]
    ShapeMismatch {
        respondent: usize,
        expected: usize,
        actual: usize,
    },

    #[snafu(display(
        "answer {value} from respondent {}{} is outside the range {min}..={max}",
        respondent + 1,
        question_suffix(question)
    ))]
    OutOfRange {
        value: CellValue,
        respondent: usize,
        question: Option<usize>,
        min: CellValue,
        max: CellValue,
    },
}

fn question_suffix(question: &Option<usize>) -> String {
    question
        .map(|q| format!(" to question {}", q + 1))
        .unwrap_or_default()
}

impl TallyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TallyError::InvalidSchema { .. } => ErrorKind::InvalidSchema,
            TallyError::EmptyInput {}
            | TallyError::CsvParse { .. }
            | TallyError::RowLength { .. }
            | TallyError::ColumnCount { .. }
            | TallyError::NotNumeric { .. }
            | TallyError::BlankAnswer { .. } => ErrorKind::MalformedInput,
            TallyError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            TallyError::OutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }

    /// Attaches the (0-based) question index to an out-of-range error.
    pub(crate) fn in_question(self, idx: usize) -> TallyError {
        match self {
            TallyError::OutOfRange {
                value,
                respondent,
                min,
                max,
                ..
            } => TallyError::OutOfRange {
                value,
                respondent,
                question: Some(idx),
                min,
                max,
            },
            e => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_range_bounds() {
        let r = AnswerRange::new(1, 5).unwrap();
        assert_eq!(r.answer_count(), 5);
        assert!(r.contains(1) && r.contains(5));
        assert!(!r.contains(0) && !r.contains(6));
        assert_eq!(r, AnswerRange::FIVE_POINT);
    }

    #[test]
    fn answer_range_rejects_sentinel_and_empty() {
        let e = AnswerRange::new(0, 5).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidSchema);
        let e = AnswerRange::new(4, 3).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidSchema);
    }

    #[test]
    fn answer_range_rejects_huge_ranges() {
        let e = AnswerRange::new(1, CellValue::MAX).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidSchema);
        let e = AnswerRange::new(1, MAX_ANSWER_COUNT as CellValue + 1).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidSchema);
        let widest = AnswerRange::new(1, MAX_ANSWER_COUNT as CellValue).unwrap();
        assert_eq!(widest.answer_count(), MAX_ANSWER_COUNT);
        assert_eq!(Histogram::empty(&widest).counts().len(), MAX_ANSWER_COUNT);
    }

    #[test]
    fn schema_needs_questions() {
        let e = Schema::new(0, AnswerRange::FIVE_POINT, 1).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidSchema);
        let s = Schema::new(3, AnswerRange::FIVE_POINT, 2)
            .unwrap()
            .delimiter(b';');
        assert_eq!(s.row_width(), 6);
        assert_eq!(s.delimiter, b';');
        assert_eq!(s.blank_policy, BlankPolicy::NoAnswer);
    }

    #[test]
    fn histogram_pairs() {
        let h = Histogram {
            min_answer: 2,
            counts: vec![1, 0, 3],
        };
        let pairs: Vec<(CellValue, u64)> = h.iter().collect();
        assert_eq!(pairs, vec![(2, 1), (3, 0), (4, 3)]);
        assert_eq!(h.total(), 4);
        assert_eq!(h.max_count(), 3);
    }

    #[test]
    fn out_of_range_message_names_question() {
        let e = TallyError::OutOfRange {
            value: 7,
            respondent: 0,
            question: None,
            min: 1,
            max: 5,
        }
        .in_question(2);
        assert_eq!(
            e.to_string(),
            "answer 7 from respondent 1 to question 3 is outside the range 1..=5"
        );
    }
}
