//! Line-oriented formatter for generated summaries and QA answers.
//!
//! The summarization backend emits loosely structured text: Roman-numbered
//! or colon-terminated section headings, markdown `##`/`###` headings, and
//! pipe-delimited tables introduced by a `TABLE:` line and terminated by a
//! blank line. [`format_summary`] turns that text into [`DisplayBlock`]s.
//! It never fails; anything unrecognized becomes a paragraph.
//!
//! ```text
//! TABLE: Key Dates            ← opens a table, title "Key Dates"
//! Event | Date                ← headers
//! ------|------               ← separator (skipped)
//! Bid due | 12 Oct<br>17:00   ← row, cell break kept as '\n'
//!                             ← blank line closes the table
//! ```
//!
//! QA answers are lighter: [`classify_answer`] tags each line as heading,
//! numbered item, bullet, or plain text.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{AnswerLine, DisplayBlock};

const TABLE_MARKER: &str = "TABLE:";
const CELL_BREAK: &str = "<br>";

const ROMAN: &str = r"M{0,3}(?:CM|CD|D?C{0,3})(?:XC|XL|X{0,3})(?:IX|IV|V?I{0,3})";

static ROMAN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^({ROMAN})\.\s")).expect("valid regex"));

static BOLD_ROMAN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\*\*({ROMAN})\.\s")).expect("valid regex"));

static NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^(?:\d+|{ROMAN})\.\s+")).expect("valid regex"));

static HEADING_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Heading:\s*").expect("valid regex"));

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.)\s*(.*)$").expect("valid regex"));

static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[*\-•]\s+(.*)$").expect("valid regex"));

static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,3}\s+(.*)$").expect("valid regex"));

/// Convert raw summary text into display blocks.
pub fn format_summary(raw: &str) -> Vec<DisplayBlock> {
    let mut blocks = Vec::new();
    // `Some` while inside a table; holds the marker line and everything after it.
    let mut table: Option<Vec<&str>> = None;

    for line in raw.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with(TABLE_MARKER) {
            if let Some(open) = table.take() {
                blocks.push(parse_table(&open));
            }
            table = Some(vec![line]);
            continue;
        }

        if let Some(buffer) = table.as_mut() {
            if !trimmed.is_empty() {
                buffer.push(line);
            } else if buffer.len() > 2 {
                blocks.push(parse_table(buffer));
                table = None;
            }
            continue;
        }

        if !trimmed.is_empty() {
            blocks.push(classify_line(line));
        }
    }

    if let Some(open) = table {
        blocks.push(parse_table(&open));
    }

    blocks
}

fn classify_line(line: &str) -> DisplayBlock {
    let trimmed = line.trim();

    if is_roman_heading(&ROMAN_HEADING, trimmed)
        || is_roman_heading(&BOLD_ROMAN_HEADING, trimmed)
        || trimmed.contains("Heading:")
        || trimmed.ends_with(':')
    {
        let text = heading_text(trimmed);
        if !text.is_empty() {
            return DisplayBlock::Heading { level: 3, text };
        }
    } else if let Some(rest) = trimmed.strip_prefix("### ") {
        return DisplayBlock::Heading {
            level: 3,
            text: rest.trim().to_string(),
        };
    } else if let Some(rest) = trimmed.strip_prefix("## ") {
        return DisplayBlock::Heading {
            level: 2,
            text: rest.trim().to_string(),
        };
    }

    DisplayBlock::Paragraph {
        text: line.to_string(),
    }
}

/// An empty numeral (a line starting with `. `) does not count.
fn is_roman_heading(pattern: &Regex, line: &str) -> bool {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .is_some_and(|numeral| !numeral.as_str().is_empty())
}

fn heading_text(line: &str) -> String {
    let mut text = line.trim_start_matches(['*', '#']).trim_start();
    if let Some(m) = NUMBERING.find(text) {
        text = &text[m.end()..];
    }
    HEADING_KEYWORD
        .replace_all(text, "")
        .trim()
        .trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace())
        .to_string()
}

fn parse_table(lines: &[&str]) -> DisplayBlock {
    let title = lines
        .first()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix(TABLE_MARKER).unwrap_or(line).trim()
        })
        .filter(|title| !title.is_empty())
        .map(str::to_string);

    let headers = lines.get(1).map(|line| split_cells(line)).unwrap_or_default();

    // A markdown separator is only recognized directly under the headers.
    let body = match lines.get(2) {
        Some(line) if is_separator_row(&split_cells(line)) => lines.get(3..).unwrap_or_default(),
        _ => lines.get(2..).unwrap_or_default(),
    };

    let rows = body
        .iter()
        .filter(|line| line.contains('|'))
        .map(|line| split_cells(line))
        .filter(|cells| !cells.is_empty())
        .map(|cells| cells.iter().map(|cell| expand_breaks(cell)).collect())
        .collect();

    DisplayBlock::Table {
        title,
        headers,
        rows,
    }
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|cell| cell.chars().all(|c| c == '-' || c == ':'))
}

fn expand_breaks(cell: &str) -> String {
    if cell.contains(CELL_BREAK) {
        cell.split(CELL_BREAK).collect::<Vec<_>>().join("\n")
    } else {
        cell.to_string()
    }
}

/// Classify each non-blank line of a QA answer.
pub fn classify_answer(text: &str) -> Vec<AnswerLine> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            if let Some(caps) = MARKDOWN_HEADING.captures(line) {
                AnswerLine::Heading {
                    text: caps[1].trim().to_string(),
                }
            } else if let Some(caps) = NUMBERED_ITEM.captures(line) {
                AnswerLine::Numbered {
                    marker: caps[1].to_string(),
                    text: caps[2].to_string(),
                }
            } else if let Some(caps) = BULLET_ITEM.captures(line) {
                AnswerLine::Bullet {
                    text: caps[1].to_string(),
                }
            } else {
                AnswerLine::Plain {
                    text: line.to_string(),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, text: &str) -> DisplayBlock {
        DisplayBlock::Heading {
            level,
            text: text.to_string(),
        }
    }

    fn paragraph(text: &str) -> DisplayBlock {
        DisplayBlock::Paragraph {
            text: text.to_string(),
        }
    }

    #[test]
    fn table_with_title_headers_and_row() {
        let blocks = format_summary("TABLE: T1\nA|B\n--|--\n1|2\n\n");
        assert_eq!(
            blocks,
            vec![DisplayBlock::Table {
                title: Some("T1".to_string()),
                headers: vec!["A".to_string(), "B".to_string()],
                rows: vec![vec!["1".to_string(), "2".to_string()]],
            }]
        );
    }

    #[test]
    fn roman_heading_strips_numbering_and_colon() {
        assert_eq!(format_summary("I. Scope:"), vec![heading(3, "Scope")]);
        assert_eq!(
            format_summary("XIV. Payment Terms"),
            vec![heading(3, "Payment Terms")]
        );
    }

    #[test]
    fn markdown_headings() {
        assert_eq!(format_summary("## Overview"), vec![heading(2, "Overview")]);
        assert_eq!(format_summary("### Details"), vec![heading(3, "Details")]);
    }

    #[test]
    fn bold_roman_heading() {
        assert_eq!(
            format_summary("**II. Eligibility Criteria**"),
            vec![heading(3, "Eligibility Criteria")]
        );
    }

    #[test]
    fn keyword_and_colon_headings() {
        assert_eq!(
            format_summary("Heading: Fact Sheet"),
            vec![heading(3, "Fact Sheet")]
        );
        assert_eq!(
            format_summary("1. Key Dates:"),
            vec![heading(3, "Key Dates")]
        );
        assert_eq!(format_summary("### Notes:"), vec![heading(3, "Notes")]);
    }

    #[test]
    fn keyword_inside_heading_leaves_single_space() {
        assert_eq!(
            format_summary("Section Heading: Scope"),
            vec![heading(3, "Section Scope")]
        );
    }

    #[test]
    fn lone_dot_is_not_a_roman_heading() {
        assert_eq!(format_summary(". trailing"), vec![paragraph(". trailing")]);
    }

    #[test]
    fn colon_only_line_stays_paragraph() {
        assert_eq!(format_summary(":"), vec![paragraph(":")]);
    }

    #[test]
    fn paragraphs_keep_raw_line() {
        let blocks = format_summary("  indented text  \n\nplain");
        assert_eq!(
            blocks,
            vec![paragraph("  indented text  "), paragraph("plain")]
        );
    }

    #[test]
    fn paragraph_reformat_is_stable() {
        let input = "The bidder must be registered.\n\nTurnover above 5 crore.\nValid GST number";
        let first = format_summary(input);
        let rebuilt = first
            .iter()
            .map(|block| match block {
                DisplayBlock::Paragraph { text } => text.clone(),
                other => panic!("unexpected block {:?}", other),
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(format_summary(&rebuilt), first);
    }

    #[test]
    fn short_table_ignores_blank_line() {
        // Blank after only marker + header keeps the table open.
        let blocks = format_summary("TABLE: Fees\nItem|Cost\n\n--|--\nEMD|50,000\n\nAfter");
        assert_eq!(
            blocks,
            vec![
                DisplayBlock::Table {
                    title: Some("Fees".to_string()),
                    headers: vec!["Item".to_string(), "Cost".to_string()],
                    rows: vec![vec!["EMD".to_string(), "50,000".to_string()]],
                },
                paragraph("After"),
            ]
        );
    }

    #[test]
    fn open_table_flushed_at_end() {
        let blocks = format_summary("Intro\nTABLE:\nA|B");
        assert_eq!(
            blocks,
            vec![
                paragraph("Intro"),
                DisplayBlock::Table {
                    title: None,
                    headers: vec!["A".to_string(), "B".to_string()],
                    rows: vec![],
                },
            ]
        );
    }

    #[test]
    fn marker_only_table_is_flushed() {
        let blocks = format_summary("TABLE: Empty");
        assert_eq!(
            blocks,
            vec![DisplayBlock::Table {
                title: Some("Empty".to_string()),
                headers: vec![],
                rows: vec![],
            }]
        );
    }

    #[test]
    fn cell_breaks_become_newlines() {
        let blocks = format_summary("TABLE: X\n|Step|Note|\n|---|:---:|\n|1|a<br>b<br>c|\n");
        match &blocks[0] {
            DisplayBlock::Table { rows, headers, .. } => {
                assert_eq!(headers, &vec!["Step".to_string(), "Note".to_string()]);
                assert_eq!(rows, &vec![vec!["1".to_string(), "a\nb\nc".to_string()]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn rows_without_pipes_are_dropped() {
        let blocks = format_summary("TABLE: X\nA|B\n--|--\nnot a row\n3|4\n\n");
        match &blocks[0] {
            DisplayBlock::Table { rows, .. } => {
                assert_eq!(rows, &vec![vec!["3".to_string(), "4".to_string()]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn placeholder_rows_after_separator_are_kept() {
        let blocks = format_summary("TABLE: Fees\nItem|Cost\n--|--\nEMD|50,000\n-|-\n\n");
        match &blocks[0] {
            DisplayBlock::Table { rows, .. } => assert_eq!(
                rows,
                &vec![
                    vec!["EMD".to_string(), "50,000".to_string()],
                    vec!["-".to_string(), "-".to_string()],
                ]
            ),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn dash_row_under_headers_is_separator() {
        let blocks = format_summary("TABLE: Fees\nItem|Cost\n-|-\n\n");
        match &blocks[0] {
            DisplayBlock::Table { rows, .. } => {
                assert_eq!(rows, &Vec::<Vec<String>>::new());
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn second_marker_flushes_first_table() {
        let blocks = format_summary("TABLE: A\nx|y\n1|2\nTABLE: B\np|q\n--|--\n3|4\n\n");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(
            &blocks[0],
            DisplayBlock::Table { title: Some(t), rows, .. } if t == "A" && rows.len() == 1
        ));
        assert!(matches!(
            &blocks[1],
            DisplayBlock::Table { title: Some(t), .. } if t == "B"
        ));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(format_summary("").is_empty());
        assert!(format_summary("\n\n   \n").is_empty());
    }

    #[test]
    fn answer_lines_are_classified() {
        let lines = classify_answer("## Eligibility\n1. Turnover\n- GST\n• PAN\n\nOther text");
        assert_eq!(
            lines,
            vec![
                AnswerLine::Heading {
                    text: "Eligibility".to_string()
                },
                AnswerLine::Numbered {
                    marker: "1.".to_string(),
                    text: "Turnover".to_string()
                },
                AnswerLine::Bullet {
                    text: "GST".to_string()
                },
                AnswerLine::Bullet {
                    text: "PAN".to_string()
                },
                AnswerLine::Plain {
                    text: "Other text".to_string()
                },
            ]
        );
    }

    #[test]
    fn answer_word_lines_are_plain() {
        let lines = classify_answer("A contract is required.");
        assert_eq!(
            lines,
            vec![AnswerLine::Plain {
                text: "A contract is required.".to_string()
            }]
        );
    }
}
