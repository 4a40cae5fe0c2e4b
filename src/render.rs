//! Plain-text rendering of display blocks, transcripts, and document lists.

use crate::models::{AnswerLine, DisplayBlock, DocumentHandle, Sender, Turn, TurnContent};

/// Render formatted summary blocks for a terminal.
pub fn render_blocks(blocks: &[DisplayBlock]) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        match block {
            DisplayBlock::Heading { level, text } => {
                if i > 0 {
                    out.push('\n');
                }
                let rule = if *level <= 2 { '=' } else { '-' };
                out.push_str(text);
                out.push('\n');
                out.extend(std::iter::repeat(rule).take(text.chars().count().max(3)));
                out.push('\n');
            }
            DisplayBlock::Paragraph { text } => {
                out.push_str(text);
                out.push('\n');
            }
            DisplayBlock::Table {
                title,
                headers,
                rows,
            } => {
                out.push('\n');
                if let Some(title) = title {
                    out.push_str(title);
                    out.push('\n');
                }
                out.push_str(&render_table(headers, rows));
                out.push('\n');
            }
        }
    }
    out
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut widths = vec![0usize; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (col, cell) in row.iter().enumerate() {
            let widest = cell.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            widths[col] = widths[col].max(widest);
        }
    }

    let separator = format!(
        "+{}+\n",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut out = separator.clone();
    if !headers.is_empty() {
        out.push_str(&render_row(headers, &widths));
        out.push_str(&separator);
    }
    for row in rows {
        out.push_str(&render_row(row, &widths));
    }
    if !rows.is_empty() {
        out.push_str(&separator);
    }
    out
}

/// One logical row; cells containing line breaks span several lines.
fn render_row(cells: &[String], widths: &[usize]) -> String {
    let split: Vec<Vec<&str>> = (0..widths.len())
        .map(|col| {
            cells
                .get(col)
                .map(|cell| cell.lines().collect())
                .unwrap_or_default()
        })
        .collect();
    let height = split.iter().map(Vec::len).max().unwrap_or(0).max(1);

    let mut out = String::new();
    for line in 0..height {
        out.push('|');
        for (col, width) in widths.iter().enumerate() {
            let text = split[col].get(line).copied().unwrap_or("");
            let pad = width - text.chars().count();
            out.push(' ');
            out.push_str(text);
            out.push_str(&" ".repeat(pad + 1));
            out.push('|');
        }
        out.push('\n');
    }
    out
}

/// Render one QA transcript turn.
pub fn render_turn(turn: &Turn) -> String {
    let prefix = match turn.sender {
        Sender::User => "you> ",
        Sender::Bot => "bot> ",
    };
    let body = match &turn.content {
        TurnContent::Text(text) => text.clone(),
        TurnContent::Lines(lines) => lines
            .iter()
            .map(|line| match line {
                AnswerLine::Heading { text } => text.to_uppercase(),
                AnswerLine::Numbered { marker, text } => format!("  {} {}", marker, text),
                AnswerLine::Bullet { text } => format!("  • {}", text),
                AnswerLine::Plain { text } => text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    };
    format!("{}{}\n", prefix, body)
}

/// One line per document: position, kind, name, id.
pub fn render_document_line(position: usize, doc: &DocumentHandle) -> String {
    let status = if doc.identity().is_ok() {
        ""
    } else {
        "  (cannot be summarized)"
    };
    format!(
        "{:>3}. [{:<7}] {}  id={}{}",
        position,
        doc.kind().as_str(),
        doc.name(),
        doc.id(),
        status
    )
}
