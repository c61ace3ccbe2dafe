// Assembly of the final .docx report.

use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Pic, Run, Style, StyleType};
use likert_tally::{ChartSection, DocumentAssembler};
use log::info;
use snafu::prelude::*;

use crate::report::chart::RenderedChart;

const TITLE_STYLE: &str = "Title";
const HEADING_STYLE: &str = "Heading1";

#[derive(Debug, Snafu)]
pub enum DocumentError {
    #[snafu(display("Error packing the document {title:?}"))]
    PackingDocx {
        source: Box<dyn std::error::Error + Send + Sync>,
        title: String,
    },
}

/// Writes the report as an Office Open XML (.docx) document, kept in memory.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DocxAssembler {
    pub title: String,
}

fn styled(text: &str, style: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text))
        .style(style)
}

impl DocumentAssembler<RenderedChart> for DocxAssembler {
    type Document = Vec<u8>;
    type Error = DocumentError;

    fn assemble(
        &self,
        sections: Vec<ChartSection<RenderedChart>>,
        comments: &[Vec<String>],
    ) -> Result<Vec<u8>, DocumentError> {
        // Font sizes are in half points.
        let mut docx = Docx::new()
            .add_style(
                Style::new(TITLE_STYLE, StyleType::Paragraph)
                    .name("Title")
                    .size(52)
                    .bold(),
            )
            .add_style(
                Style::new(HEADING_STYLE, StyleType::Paragraph)
                    .name("Heading 1")
                    .size(32)
                    .bold(),
            )
            .add_paragraph(styled(&self.title, TITLE_STYLE));

        let num_sections = sections.len();
        for section in sections {
            let chart = section.chart;
            let pic = Pic::new_with_dimensions(chart.png, chart.width, chart.height);
            docx = docx
                .add_paragraph(styled(&section.label, HEADING_STYLE))
                .add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));
        }

        docx = docx.add_paragraph(styled("Comments", TITLE_STYLE));
        for (idx, block) in comments.iter().enumerate() {
            // Space between two respondents, never inside the comments of one.
            if idx > 0 {
                docx = docx.add_paragraph(Paragraph::new());
            }
            for comment in block.iter() {
                docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(comment)));
            }
        }

        let mut buf = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buf)
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })
            .context(PackingDocxSnafu {
                title: self.title.clone(),
            })?;
        let bytes = buf.into_inner();
        info!(
            "assemble: document {:?}: {} sections, {} comment blocks, {} bytes",
            self.title,
            num_sections,
            comments.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::chart::{BarChartRenderer, ChartTitle};
    use likert_tally::{tally, AnswerRange, ChartRenderer};

    // All the paragraphs of a document, as plain text.
    fn paragraphs(bytes: &[u8]) -> Vec<String> {
        let docx = docx_rs::read_docx(bytes).unwrap();
        let mut res = Vec::new();
        for child in docx.document.children.iter() {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                let mut text = String::new();
                for pc in p.children.iter() {
                    if let docx_rs::ParagraphChild::Run(run) = pc {
                        for rc in run.children.iter() {
                            if let docx_rs::RunChild::Text(t) = rc {
                                text.push_str(&t.text);
                            }
                        }
                    }
                }
                res.push(text);
            }
        }
        res
    }

    fn section(label: &str, renderer: &BarChartRenderer) -> ChartSection<RenderedChart> {
        let hist = tally(&[1, 2, 2], &AnswerRange::FIVE_POINT).unwrap();
        ChartSection {
            label: label.to_string(),
            chart: renderer.render(label, &hist, 3).unwrap(),
        }
    }

    #[test]
    fn layout() {
        let renderer = BarChartRenderer {
            title: ChartTitle::BeforeSeparator('.'),
            ..Default::default()
        };
        let assembler = DocxAssembler {
            title: "Cultural Questions Analysis".to_string(),
        };
        let comments = vec![
            vec!["a1".to_string(), "a2".to_string()],
            vec!["b1".to_string(), "b2".to_string()],
        ];
        let bytes = assembler
            .assemble(
                vec![
                    section("1. First question", &renderer),
                    section("2. Second question", &renderer),
                ],
                &comments,
            )
            .unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let texts = paragraphs(&bytes);
        assert_eq!(
            texts,
            vec![
                "Cultural Questions Analysis",
                "1. First question",
                "",
                "2. Second question",
                "",
                "Comments",
                "a1",
                "a2",
                "",
                "b1",
                "b2",
            ]
        );
    }

    #[test]
    fn no_questions_no_comments() {
        let assembler = DocxAssembler {
            title: "Empty".to_string(),
        };
        let bytes = assembler.assemble(Vec::new(), &[]).unwrap();
        assert_eq!(paragraphs(&bytes), vec!["Empty", "Comments"]);
    }
}
