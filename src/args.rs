use clap::Parser;

/// This is a survey report generator: one bar chart per question, and the comments.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the survey and the report. Every other option
    /// overrides the corresponding entry of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The export of the survey responses, one line per respondent, with a header line.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, default report.docx) Where to write the report.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) If specified, the counts for every question will be written in JSON
    /// format to the given location.
    #[clap(long, value_parser)]
    pub summary: Option<String>,

    /// The number of question columns, after the timestamp column.
    #[clap(long, value_parser)]
    pub questions: Option<usize>,

    /// (default 1) The lowest valid answer.
    #[clap(long, value_parser)]
    pub min_answer: Option<i64>,

    /// (default 5) The highest valid answer.
    #[clap(long, value_parser)]
    pub max_answer: Option<i64>,

    /// (default 0) The number of free-text columns at the end of each line.
    #[clap(long, value_parser)]
    pub comments: Option<usize>,

    /// (single character, default ',') The column delimiter of the input.
    #[clap(long, value_parser)]
    pub delimiter: Option<String>,

    /// The title at the top of the report.
    #[clap(long, value_parser)]
    pub title: Option<String>,

    /// (single character, optional) Only keep the text before this character in the chart titles,
    /// for example '.' to only show the question number.
    #[clap(long, value_parser)]
    pub chart_title_separator: Option<String>,

    /// If passed as an argument, a blank answer is an error instead of being skipped.
    #[clap(long, takes_value = false)]
    pub reject_blanks: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
