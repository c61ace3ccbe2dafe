use std::error::Error;
use std::fmt::Display;

use log::{debug, info};

use crate::config::*;
use crate::{load, tally, transpose};

/// Draws the chart of a single question.
pub trait ChartRenderer {
    type Chart;
    type Error: Error + 'static;

    /// `y_axis_upper_bound` is the same for every chart of a report, so that
    /// charts can be compared by eye.
    fn render(
        &self,
        label: &str,
        histogram: &Histogram,
        y_axis_upper_bound: u64,
    ) -> Result<Self::Chart, Self::Error>;
}

/// A question label with its rendered chart.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChartSection<C> {
    pub label: String,
    pub chart: C,
}

/// Puts the charts and the comments together into the final document.
pub trait DocumentAssembler<C> {
    type Document;
    type Error: Error + 'static;

    /// `sections` come in question order. `comments` holds one block per
    /// respondent, in submission order.
    fn assemble(
        &self,
        sections: Vec<ChartSection<C>>,
        comments: &[Vec<String>],
    ) -> Result<Self::Document, Self::Error>;
}

/// Failure of a report run.
///
/// The errors of the collaborators are passed through as they were returned.
#[derive(Debug)]
pub enum PipelineError<R, D> {
    Tally(TallyError),
    Render(R),
    Assemble(D),
}

impl<R: Display, D: Display> Display for PipelineError<R, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Tally(e) => write!(f, "tabulation failed: {}", e),
            PipelineError::Render(e) => write!(f, "{}", e),
            PipelineError::Assemble(e) => write!(f, "{}", e),
        }
    }
}

impl<R: Error + 'static, D: Error + 'static> Error for PipelineError<R, D> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Tally(e) => Some(e),
            PipelineError::Render(e) => e.source(),
            PipelineError::Assemble(e) => e.source(),
        }
    }
}

impl<R, D> From<TallyError> for PipelineError<R, D> {
    fn from(e: TallyError) -> Self {
        PipelineError::Tally(e)
    }
}

/// Splits the flat comment list into one block per respondent.
///
/// Every `per_respondent` consecutive entries belong to the same respondent.
pub fn group_comments(comments: &[String], per_respondent: usize) -> Vec<Vec<String>> {
    if per_respondent == 0 {
        return Vec::new();
    }
    comments
        .chunks(per_respondent)
        .map(|block| block.to_vec())
        .collect()
}

/// Loads, transposes and tallies a whole export.
///
/// All the questions are tallied before returning, so a bad answer anywhere in the
/// export fails the run before anything is drawn.
pub fn tabulate(source: &str, schema: &Schema) -> Result<Tabulation, TallyError> {
    info!(
        "tabulate: {} questions, answers {}..={}, {} comment columns",
        schema.question_count,
        schema.answer_range.min(),
        schema.answer_range.max(),
        schema.comment_column_count
    );
    let data = load(source, schema)?;
    let respondent_count = data.responses.len();
    let matrix = transpose(&data.responses, schema.question_count)?;

    // Both come from the same stripped columns.
    debug_assert_eq!(data.headers.len(), matrix.len());

    let mut questions: Vec<QuestionSummary> = Vec::with_capacity(matrix.len());
    for (idx, (label, answers)) in data.headers.into_iter().zip(matrix.iter()).enumerate() {
        let histogram = tally(answers, &schema.answer_range).map_err(|e| e.in_question(idx))?;
        let blank_count = answers.iter().filter(|v| **v == NO_ANSWER).count() as u64;
        debug!(
            "tabulate: question {:?}: {:?} blanks: {}",
            label,
            histogram.counts(),
            blank_count
        );
        questions.push(QuestionSummary {
            label,
            histogram,
            blank_count,
        });
    }

    Ok(Tabulation {
        questions,
        comments: group_comments(&data.comments, schema.comment_column_count),
        respondent_count,
    })
}

/// Draws every question of a tabulation, then assembles the document.
///
/// The first failing collaborator stops the run.
pub fn render_report<R, D>(
    tabulation: &Tabulation,
    renderer: &R,
    assembler: &D,
) -> Result<D::Document, PipelineError<R::Error, D::Error>>
where
    R: ChartRenderer,
    D: DocumentAssembler<R::Chart>,
{
    let y_axis_upper_bound = tabulation.y_axis_upper_bound();
    let mut sections: Vec<ChartSection<R::Chart>> = Vec::with_capacity(tabulation.questions.len());
    for q in tabulation.questions.iter() {
        let chart = renderer
            .render(&q.label, &q.histogram, y_axis_upper_bound)
            .map_err(PipelineError::Render)?;
        sections.push(ChartSection {
            label: q.label.clone(),
            chart,
        });
    }
    info!(
        "render_report: {} charts, {} comment blocks",
        sections.len(),
        tabulation.comments.len()
    );
    assembler
        .assemble(sections, &tabulation.comments)
        .map_err(PipelineError::Assemble)
}

/// Runs the full report: load, transpose, tally, then render and assemble.
pub fn run_report<R, D>(
    source: &str,
    schema: &Schema,
    renderer: &R,
    assembler: &D,
) -> Result<D::Document, PipelineError<R::Error, D::Error>>
where
    R: ChartRenderer,
    D: DocumentAssembler<R::Chart>,
{
    let tabulation = tabulate(source, schema)?;
    render_report(&tabulation, renderer, assembler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;

    #[derive(Debug, PartialEq)]
    struct Refused(String);

    impl Display for Refused {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "refused: {}", self.0)
        }
    }

    impl Error for Refused {}

    // Records what it was asked to draw. Fails on the labels listed in `refuse`.
    #[derive(Default)]
    struct RecordingRenderer {
        refuse: Vec<String>,
        calls: RefCell<Vec<(String, Vec<u64>, u64)>>,
    }

    impl ChartRenderer for RecordingRenderer {
        type Chart = Vec<u64>;
        type Error = Refused;

        fn render(
            &self,
            label: &str,
            histogram: &Histogram,
            y_axis_upper_bound: u64,
        ) -> Result<Vec<u64>, Refused> {
            if self.refuse.iter().any(|r| r == label) {
                return Err(Refused(label.to_string()));
            }
            self.calls.borrow_mut().push((
                label.to_string(),
                histogram.counts().to_vec(),
                y_axis_upper_bound,
            ));
            Ok(histogram.counts().to_vec())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Outline {
        sections: Vec<(String, Vec<u64>)>,
        comments: Vec<Vec<String>>,
    }

    struct OutlineAssembler;

    impl DocumentAssembler<Vec<u64>> for OutlineAssembler {
        type Document = Outline;
        type Error = Refused;

        fn assemble(
            &self,
            sections: Vec<ChartSection<Vec<u64>>>,
            comments: &[Vec<String>],
        ) -> Result<Outline, Refused> {
            Ok(Outline {
                sections: sections.into_iter().map(|s| (s.label, s.chart)).collect(),
                comments: comments.to_vec(),
            })
        }
    }

    struct FailingAssembler;

    impl DocumentAssembler<Vec<u64>> for FailingAssembler {
        type Document = ();
        type Error = Refused;

        fn assemble(
            &self,
            _sections: Vec<ChartSection<Vec<u64>>>,
            _comments: &[Vec<String>],
        ) -> Result<(), Refused> {
            Err(Refused("disk full".to_string()))
        }
    }

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn five_point(questions: usize, comments: usize) -> Schema {
        Schema::new(questions, AnswerRange::FIVE_POINT, comments).unwrap()
    }

    const SCENARIO_A: &str = "Timestamp,Q1,Q2,Comments\nt1,2,4,c1\nt2,,4,c2\n";

    #[test]
    fn scenario_a() {
        init_logs();
        let schema = five_point(2, 1);
        let data = load(SCENARIO_A, &schema).unwrap();
        let matrix = transpose(&data.responses, 2).unwrap();
        assert_eq!(matrix, vec![vec![2, 0], vec![4, 4]]);
        assert_eq!(data.comments, vec!["c1", "c2"]);

        let tab = tabulate(SCENARIO_A, &schema).unwrap();
        assert_eq!(tab.questions[0].histogram.counts(), &[0, 1, 0, 0, 0]);
        assert_eq!(tab.questions[1].histogram.counts(), &[0, 0, 0, 2, 0]);
        assert_eq!(tab.questions[0].blank_count, 1);
        assert_eq!(tab.respondent_count, 2);
        assert_eq!(
            tab.comments,
            vec![vec!["c1".to_string()], vec!["c2".to_string()]]
        );
    }

    #[test]
    fn scenario_b() {
        let source = "ts,Q1,Q2,Comments\nt1,1,2\n";
        let e = tabulate(source, &five_point(2, 1)).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn scenario_c() {
        let source = "ts,Q1,Q2\nt1,1,2\nt2,7,3\n";
        let e = tabulate(source, &five_point(2, 0)).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::OutOfRange);
        assert!(matches!(
            e,
            TallyError::OutOfRange {
                value: 7,
                respondent: 1,
                question: Some(0),
                ..
            }
        ));
    }

    #[test]
    fn scenario_d() {
        init_logs();
        let schema = five_point(3, 1);
        let source = "ts,Q1,Q2,Q3,Comments\n";
        let tab = tabulate(source, &schema).unwrap();
        assert_eq!(tab.questions.len(), 3);
        assert!(tab.questions.iter().all(|q| q.histogram.total() == 0));
        assert!(tab.comments.is_empty());

        let renderer = RecordingRenderer::default();
        let outline = run_report(source, &schema, &renderer, &OutlineAssembler).unwrap();
        assert_eq!(
            outline.sections,
            vec![
                ("Q1".to_string(), vec![0; 5]),
                ("Q2".to_string(), vec![0; 5]),
                ("Q3".to_string(), vec![0; 5]),
            ]
        );
        // An empty survey still gets a usable axis.
        assert!(renderer.calls.borrow().iter().all(|c| c.2 == 1));
    }

    #[test]
    fn report_in_header_order() {
        let source = "ts,1. First,2. Second,3. Third,Why,Anything else\n\
                      t1,1,2,3,a,b\n\
                      t2,5,,1,c,d\n\
                      t3,2,2,2,e,f\n";
        let renderer = RecordingRenderer::default();
        let outline =
            run_report(source, &five_point(3, 2), &renderer, &OutlineAssembler).unwrap();
        let labels: Vec<&str> = outline.sections.iter().map(|s| s.0.as_str()).collect();
        assert_eq!(labels, vec!["1. First", "2. Second", "3. Third"]);
        assert_eq!(outline.sections[0].1, vec![1, 1, 0, 0, 1]);
        assert_eq!(outline.sections[1].1, vec![0, 2, 0, 0, 0]);
        assert_eq!(outline.sections[2].1, vec![1, 1, 1, 0, 0]);
        assert_eq!(
            outline.comments,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
                vec!["e".to_string(), "f".to_string()],
            ]
        );
        // The y axis goes up to the number of respondents.
        assert!(renderer.calls.borrow().iter().all(|c| c.2 == 3));
    }

    #[test]
    fn bad_answer_stops_before_rendering() {
        let source = "ts,Q1,Q2\nt1,1,2\nt2,3,9\n";
        let renderer = RecordingRenderer::default();
        let e = run_report(source, &five_point(2, 0), &renderer, &OutlineAssembler)
            .unwrap_err();
        assert!(matches!(e, PipelineError::Tally(_)));
        assert!(renderer.calls.borrow().is_empty());
    }

    #[test]
    fn renderer_error_is_passed_through() {
        let renderer = RecordingRenderer {
            refuse: vec!["Q2".to_string()],
            ..Default::default()
        };
        let e = run_report(SCENARIO_A, &five_point(2, 1), &renderer, &OutlineAssembler)
            .unwrap_err();
        match e {
            PipelineError::Render(r) => assert_eq!(r, Refused("Q2".to_string())),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn assembler_error_is_passed_through() {
        let renderer = RecordingRenderer::default();
        let e = run_report(SCENARIO_A, &five_point(2, 1), &renderer, &FailingAssembler)
            .unwrap_err();
        assert_eq!(e.to_string(), "refused: disk full");
        assert!(matches!(e, PipelineError::Assemble(_)));
    }

    #[test]
    fn comment_blocks() {
        let comments: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(group_comments(&comments, 2).len(), 2);
        assert_eq!(group_comments(&comments, 1).len(), 4);
        assert!(group_comments(&comments, 0).is_empty());
        assert!(group_comments(&[], 3).is_empty());
    }

    fn export() -> impl Strategy<Value = (usize, usize, Vec<Vec<Option<CellValue>>>)> {
        (1usize..6, 0usize..3, 0usize..6).prop_flat_map(|(questions, comments, respondents)| {
            (
                Just(questions),
                Just(comments),
                prop::collection::vec(
                    prop::collection::vec(prop::option::of(1 as CellValue..=5), questions),
                    respondents,
                ),
            )
        })
    }

    fn render_csv(questions: usize, comments: usize, rows: &[Vec<Option<CellValue>>]) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut header = vec!["Timestamp".to_string()];
        header.extend((0..questions).map(|q| format!("{}. Question", q + 1)));
        header.extend((0..comments).map(|c| format!("Comment {}", c + 1)));
        lines.push(header.join(","));
        for (r, row) in rows.iter().enumerate() {
            let mut cells = vec![format!("t{}", r)];
            cells.extend(
                row.iter()
                    .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
            );
            cells.extend((0..comments).map(|c| format!("r{}c{}", r, c)));
            lines.push(cells.join(","));
        }
        lines.join("\n")
    }

    proptest! {
        #[test]
        fn labels_follow_questions((questions, comments, rows) in export()) {
            let source = render_csv(questions, comments, &rows);
            let tab = tabulate(&source, &five_point(questions, comments)).unwrap();
            prop_assert_eq!(tab.questions.len(), questions);
            for (q, summary) in tab.questions.iter().enumerate() {
                prop_assert_eq!(&summary.label, &format!("{}. Question", q + 1));
                let answered = rows.iter().filter(|row| row[q].is_some()).count() as u64;
                prop_assert_eq!(summary.histogram.total(), answered);
                prop_assert_eq!(summary.blank_count, rows.len() as u64 - answered);
            }
            prop_assert_eq!(tab.comments.len(), if comments == 0 { 0 } else { rows.len() });
            for (r, block) in tab.comments.iter().enumerate() {
                prop_assert_eq!(block.len(), comments);
                let prefix = format!("r{}c", r);
                prop_assert!(block.iter().all(|c| c.starts_with(&prefix)));
            }
        }
    }
}
