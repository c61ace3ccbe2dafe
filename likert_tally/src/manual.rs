/*!

This is the long-form manual for `likert_tally` and `survey_report`.

## Input format

The input is the delimited export of an online form (Google Forms, Microsoft Forms),
one line per submission, with a header line:

```text
Timestamp,1. I feel welcome here,2. My work is valued,Comments,Other remarks
2022/11/01 10:02:11,4,5,Great team,
2022/11/01 10:05:43,,3.0,,Too many meetings
```

- The first column is the submission timestamp. It is always dropped.
- The next `questionCount` columns are the answers, one question per column. The text
  of the header is the question label.
- The last `commentColumnCount` columns are free text. They are collected in order and
  printed at the end of the report, one block per submission.

The number of questions, the answer range and the number of comment columns are not
guessed from the file: they must be provided.

Answers are read as follows:
- a blank cell means no answer. It is shown in no bar and is counted separately
  (or, with the `reject` blank policy, it stops the run);
- a whole number is used as is;
- a decimal number is truncated toward zero, so `3.0` and `3.7` both count as `3`;
- anything else stops the run with an error naming the line and the column.

A number outside the answer range (for example `7` on a 1 to 5 scale) also stops the run.
Values are never clamped.

## Configuration

`survey_report` accepts a configuration file in JSON:

```json
{
  "inputSettings": { "filePath": "responses.csv", "delimiter": "," },
  "schema": {
    "questionCount": 52,
    "minAnswer": 1,
    "maxAnswer": 5,
    "commentColumnCount": 2,
    "blankPolicy": "noAnswer"
  },
  "outputSettings": {
    "reportTitle": "Cultural Questions Analysis",
    "outputPath": "report.docx",
    "summaryPath": "summary.json",
    "chartTitleSeparator": "."
  }
}
```

- `inputSettings.filePath` (string): the export. A relative path is read from the
  directory of the configuration file.
- `inputSettings.delimiter` (single character, optional, default `,`).
- `schema.questionCount` (number, required).
- `schema.minAnswer`, `schema.maxAnswer` (numbers, optional, default 1 and 5).
  `minAnswer` must be at least 1.
- `schema.commentColumnCount` (number, optional, default 0).
- `schema.blankPolicy` (`noAnswer` or `reject`, optional, default `noAnswer`).
- `outputSettings.reportTitle` (string, optional): the title at the top of the document.
- `outputSettings.outputPath` (string, optional, default `report.docx`).
- `outputSettings.summaryPath` (string, optional): if set, the counts are also written
  in JSON to this file.
- `outputSettings.chartTitleSeparator` (single character, optional): if set, the title
  drawn on each chart only keeps the text of the label before this character. With `.`,
  the chart of `12. I feel welcome here` is titled `12`.

Every option has a command line flag that takes precedence over the file, see
`survey_report --help`.

## Output

A `.docx` document with the title, then for each question a heading with the full
label and the bar chart of the answers, then a `Comments` section. Each chart carries
its title and the `Number of Responses` axis label.

 */
