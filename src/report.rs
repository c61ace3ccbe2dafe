use log::{debug, info, warn};

use likert_tally::*;
use snafu::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;

use crate::args::Args;
use crate::report::chart::{BarChartRenderer, ChartError, ChartTitle};
use crate::report::config_reader::*;
use crate::report::document::{DocumentError, DocxAssembler};
use crate::report::io_common::{read_source, write_output};

pub mod chart;
pub mod config_reader;
pub mod document;
mod io_common;

pub const DEFAULT_TITLE: &str = "Survey Results";
pub const DEFAULT_OUTPUT: &str = "report.docx";

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error reading the responses from {path}"))]
    ReadingInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error encoding the summary"))]
    EncodingSummary { source: serde_json::Error },

    #[snafu(display("Missing setting {name}: it must be given in the configuration file or on the command line"))]
    MissingSetting { name: String },
    #[snafu(display("Invalid value for {name}: {value:?}"))]
    InvalidSetting { name: String, value: String },
    #[snafu(display("Invalid survey schema"))]
    InvalidSchema { source: TallyError },

    #[snafu(display("Could not tabulate the responses in {path}"))]
    Tabulating { source: TallyError, path: String },
    #[snafu(display("Could not produce the report"))]
    Rendering {
        source: PipelineError<ChartError, DocumentError>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// All the options of a run, once the configuration file and the command line are merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportSettings {
    pub input_path: String,
    pub output_path: String,
    pub summary_path: Option<String>,
    pub title: String,
    pub chart_title: ChartTitle,
    pub schema: Schema,
}

/// Merges the configuration file (and the directory it was read from) with the
/// command line. The command line wins.
pub fn resolve_settings(
    args: &Args,
    config: Option<(SurveyConfig, PathBuf)>,
) -> ReportResult<ReportSettings> {
    let (input_settings, schema_settings, output_settings, root_p) = match config {
        Some((c, root_p)) => (c.input_settings, c.schema, c.output_settings, root_p),
        None => (None, None, OutputSettings::default(), PathBuf::new()),
    };

    let input_path = match (&args.input, &input_settings) {
        (Some(p), _) => p.clone(),
        (None, Some(is)) => root_p.join(&is.file_path).display().to_string(),
        (None, None) => return MissingSettingSnafu { name: "input" }.fail(),
    };

    let question_count = args
        .questions
        .or_else(|| schema_settings.as_ref().map(|s| s.question_count))
        .context(MissingSettingSnafu {
            name: "questionCount",
        })?;
    let min_answer = args
        .min_answer
        .or_else(|| schema_settings.as_ref().and_then(|s| s.min_answer))
        .unwrap_or(1);
    let max_answer = args
        .max_answer
        .or_else(|| schema_settings.as_ref().and_then(|s| s.max_answer))
        .unwrap_or(5);
    let comment_column_count = args
        .comments
        .or_else(|| schema_settings.as_ref().and_then(|s| s.comment_column_count))
        .unwrap_or(0);
    let blank_policy = if args.reject_blanks {
        BlankPolicy::Reject
    } else {
        match schema_settings.as_ref().and_then(|s| s.blank_policy.clone()) {
            Some(s) => parse_blank_policy(&s)?,
            None => BlankPolicy::NoAnswer,
        }
    };
    let delimiter = match args
        .delimiter
        .clone()
        .or_else(|| input_settings.as_ref().and_then(|is| is.delimiter.clone()))
    {
        Some(s) => {
            let c = parse_single_char("delimiter", &s)?;
            ensure!(
                c.is_ascii(),
                InvalidSettingSnafu {
                    name: "delimiter",
                    value: s,
                }
            );
            c as u8
        }
        None => b',',
    };

    let range = AnswerRange::new(min_answer, max_answer).context(InvalidSchemaSnafu {})?;
    let schema = Schema::new(question_count, range, comment_column_count)
        .context(InvalidSchemaSnafu {})?
        .blank_policy(blank_policy)
        .delimiter(delimiter);

    let chart_title = match args
        .chart_title_separator
        .clone()
        .or(output_settings.chart_title_separator)
    {
        Some(s) => ChartTitle::BeforeSeparator(parse_single_char("chartTitleSeparator", &s)?),
        None => ChartTitle::Full,
    };

    Ok(ReportSettings {
        input_path,
        output_path: args
            .out
            .clone()
            .or(output_settings.output_path)
            .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        summary_path: args.summary.clone().or(output_settings.summary_path),
        title: args
            .title
            .clone()
            .or(output_settings.report_title)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        chart_title,
        schema,
    })
}

fn build_summary_js(settings: &ReportSettings, tabulation: &Tabulation) -> JSValue {
    let questions: Vec<JSValue> = tabulation
        .questions
        .iter()
        .map(|q| {
            let counts: Vec<JSValue> = q
                .histogram
                .iter()
                .map(|(answer, count)| json!({"answer": answer, "count": count}))
                .collect();
            json!({
                "label": q.label,
                "counts": counts,
                "answered": q.histogram.total(),
                "blank": q.blank_count,
            })
        })
        .collect();
    json!({
        "title": settings.title,
        "minAnswer": settings.schema.answer_range.min(),
        "maxAnswer": settings.schema.answer_range.max(),
        "respondents": tabulation.respondent_count,
        "questions": questions,
    })
}

/// Runs one report from the command line arguments.
///
/// Nothing is written unless every question could be tallied and drawn.
pub fn run_report(args: &Args) -> ReportResult<()> {
    let config = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root_p = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            Some((config, root_p))
        }
        None => None,
    };

    let settings = resolve_settings(args, config)?;
    info!("run_report: settings: {:?}", settings);

    let source = read_source(&settings.input_path)?;
    let tabulation = tabulate(&source, &settings.schema).context(TabulatingSnafu {
        path: settings.input_path.clone(),
    })?;
    debug!("run_report: tabulation: {:?}", tabulation);

    let renderer = BarChartRenderer {
        title: settings.chart_title,
        ..Default::default()
    };
    let assembler = DocxAssembler {
        title: settings.title.clone(),
    };
    let document = render_report(&tabulation, &renderer, &assembler).context(RenderingSnafu {})?;

    let summary = match &settings.summary_path {
        Some(summary_path) => {
            let summary_js = build_summary_js(&settings, &tabulation);
            let pretty_js =
                serde_json::to_string_pretty(&summary_js).context(EncodingSummarySnafu {})?;
            Some((summary_path, pretty_js))
        }
        None => None,
    };

    write_output(&settings.output_path, &document)?;
    info!("run_report: report written to {}", settings.output_path);

    match summary {
        Some((summary_path, pretty_js)) => {
            if let Err(e) = write_output(summary_path, pretty_js.as_bytes()) {
                // A run writes both files or none of them.
                if let Err(rm) = fs::remove_file(&settings.output_path) {
                    warn!(
                        "run_report: could not remove {}: {}",
                        settings.output_path, rm
                    );
                }
                return Err(e);
            }
            info!("run_report: summary written to {}", summary_path);
        }
        None => {
            let blanks: u64 = tabulation.questions.iter().map(|q| q.blank_count).sum();
            if blanks > 0 {
                warn!("run_report: {} blank answers were left out of the charts", blanks);
            }
        }
    }
    Ok(())
}
