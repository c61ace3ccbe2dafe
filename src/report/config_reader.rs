use crate::report::*;

use std::fs;

use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportTitle")]
    pub report_title: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    #[serde(rename = "chartTitleSeparator")]
    pub chart_title_separator: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub delimiter: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSettings {
    #[serde(rename = "questionCount")]
    pub question_count: usize,
    #[serde(rename = "minAnswer")]
    pub min_answer: Option<i64>,
    #[serde(rename = "maxAnswer")]
    pub max_answer: Option<i64>,
    #[serde(rename = "commentColumnCount")]
    pub comment_column_count: Option<usize>,
    #[serde(rename = "blankPolicy")]
    pub blank_policy: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "inputSettings")]
    pub input_settings: Option<InputSettings>,
    pub schema: Option<SchemaSettings>,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
}

pub fn read_config(path: &str) -> ReportResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: content: {:?}", contents);
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn parse_blank_policy(s: &str) -> ReportResult<BlankPolicy> {
    match s {
        "noAnswer" => Ok(BlankPolicy::NoAnswer),
        "reject" => Ok(BlankPolicy::Reject),
        x => InvalidSettingSnafu {
            name: "blankPolicy",
            value: x,
        }
        .fail(),
    }
}

/// Reads an option that must be exactly one character long.
pub fn parse_single_char(name: &str, s: &str) -> ReportResult<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => InvalidSettingSnafu { name, value: s }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let js = r#"{
            "inputSettings": { "filePath": "responses.csv", "delimiter": ";" },
            "schema": {
                "questionCount": 52,
                "minAnswer": 1,
                "maxAnswer": 5,
                "commentColumnCount": 2,
                "blankPolicy": "reject"
            },
            "outputSettings": {
                "reportTitle": "Cultural Questions Analysis",
                "outputPath": "report.docx",
                "chartTitleSeparator": "."
            }
        }"#;
        let config: SurveyConfig = serde_json::from_str(js).unwrap();
        let input = config.input_settings.unwrap();
        assert_eq!(input.file_path, "responses.csv");
        assert_eq!(input.delimiter.as_deref(), Some(";"));
        let schema = config.schema.unwrap();
        assert_eq!(schema.question_count, 52);
        assert_eq!(schema.comment_column_count, Some(2));
        assert_eq!(schema.blank_policy.as_deref(), Some("reject"));
        assert_eq!(
            config.output_settings.report_title.as_deref(),
            Some("Cultural Questions Analysis")
        );
        assert_eq!(config.output_settings.summary_path, None);
    }

    #[test]
    fn minimal_config() {
        let js = r#"{ "schema": { "questionCount": 3 } }"#;
        let config: SurveyConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.input_settings, None);
        assert_eq!(config.output_settings, OutputSettings::default());
        let schema = config.schema.unwrap();
        assert_eq!(schema.min_answer, None);
    }

    #[test]
    fn blank_policies() {
        assert_eq!(parse_blank_policy("noAnswer").unwrap(), BlankPolicy::NoAnswer);
        assert_eq!(parse_blank_policy("reject").unwrap(), BlankPolicy::Reject);
        assert!(parse_blank_policy("zero").is_err());
    }

    #[test]
    fn single_chars() {
        assert_eq!(parse_single_char("delimiter", ";").unwrap(), ';');
        assert!(parse_single_char("delimiter", "").is_err());
        assert!(parse_single_char("delimiter", ",;").is_err());
    }
}
