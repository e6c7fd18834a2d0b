use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scoring::EvidenceRecord;

const EMPTY_RANKING: &str = "No aligned resources found.";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a weighted total with three decimals ("2.500")
pub fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, counting chars rather than bytes.
/// Line breaks collapse to spaces so each record stays on one row.
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();
    if chars.len() <= max_width {
        chars.into_iter().collect()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format a ranking as a table: Index, Score, Statement, Content, URL.
/// No headers. Content is truncated to the terminal width when attached to one.
pub fn format_ranking_table(records: &[EvidenceRecord], use_colors: bool) -> String {
    if records.is_empty() {
        return EMPTY_RANKING.to_string();
    }

    let term_width = get_terminal_width();

    let index_width = format!("{}.", records.len()).len();
    let score_width = 7;
    let statement_width = records
        .iter()
        .map(|r| r.statement.chars().count())
        .max()
        .unwrap_or(0);
    let separator = "  ";

    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let index_str = format!("{:>width$}", format!("{}.", idx + 1), width = index_width);
            let score_str = format!("{:>width$}", format_score(record.weighted_total), width = score_width);
            let statement_str = format!("{:<width$}", record.statement, width = statement_width);

            let fixed_width = index_width
                + 1
                + score_width
                + statement_width
                + separator.len() * 3
                + record.url.chars().count();
            let content = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_text(&record.content, width - fixed_width)
                }
                // Very narrow terminal
                Some(_) => truncate_text(&record.content, 20),
                None => truncate_text(&record.content, usize::MAX),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    score_str.bold(),
                    separator,
                    statement_str.cyan(),
                    separator,
                    content,
                    separator,
                    record.url.underline()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str, score_str, separator, statement_str, separator, content, separator,
                    record.url
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one record with its per-signal breakdown (for verbose mode)
pub fn format_record_detail(record: &EvidenceRecord, use_colors: bool) -> String {
    if use_colors {
        format!(
            "{}\n  Statement: {}\n  Score: {} (expert {}, usage {}, text {})\n  Content: {}",
            record.url.underline(),
            record.statement.cyan(),
            format_score(record.weighted_total).bold(),
            format_score(record.expert),
            format_score(record.usage),
            format_score(record.text_based),
            record.content
        )
    } else {
        format!(
            "{}\n  Statement: {}\n  Score: {} (expert {}, usage {}, text {})\n  Content: {}",
            record.url,
            record.statement,
            format_score(record.weighted_total),
            format_score(record.expert),
            format_score(record.usage),
            format_score(record.text_based),
            record.content
        )
    }
}

/// Format records as tab-separated values for scripting
/// Columns: weighted total, expert, usage, text, statement, url (no headers, no colors)
pub fn format_tsv(records: &[EvidenceRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                format_score(r.weighted_total),
                format_score(r.expert),
                format_score(r.usage),
                format_score(r.text_based),
                r.statement,
                r.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
