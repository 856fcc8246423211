//! Terminal UI helpers for explorer display.
//!
//! This module uses println! for CLI output, which is appropriate
//! for terminal user interfaces.

#![allow(clippy::disallowed_macros)]

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::entities::{
    source_label, AuthorStat, DailyCount, FilterSelection, Keyword, Mention, ResultTable, Rule,
    RuleId, RuleResult, SentimentBreakdown,
};
use crate::highlight::{highlight, HighlightKind, Span};

const PREVIEW_CHARS: usize = 80;

/// Shorten text to `max` characters on one line
fn preview(text: &str, max: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max {
        line
    } else {
        let cut: String = line.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn sentiment_color(sentiment: &str) -> Color {
    match sentiment.to_lowercase().as_str() {
        "positive" => Color::Green,
        "negative" => Color::Red,
        _ => Color::DarkGrey,
    }
}

/// Get colored sentiment string
pub fn sentiment_colored(sentiment: &str) -> String {
    match sentiment.to_lowercase().as_str() {
        "positive" => sentiment.green().to_string(),
        "negative" => sentiment.red().to_string(),
        _ => sentiment.dimmed().to_string(),
    }
}

/// Create a table for displaying mentions
pub fn mention_table(mentions: &[Mention]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Author").fg(Color::Cyan),
        Cell::new("Source").fg(Color::Cyan),
        Cell::new("Sentiment").fg(Color::Cyan),
        Cell::new("Content").fg(Color::Cyan),
    ]);

    for mention in mentions {
        // dates arrive as ISO-8601; the day is enough here
        let date = mention
            .date
            .as_deref()
            .map_or("-", |d| d.get(..10).unwrap_or(d));

        table.add_row(vec![
            Cell::new(mention.id),
            Cell::new(date),
            Cell::new(mention.author_display()),
            Cell::new(&mention.source),
            Cell::new(&mention.sentiment).fg(sentiment_color(&mention.sentiment)),
            Cell::new(preview(mention.content_text(), PREVIEW_CHARS)),
        ]);
    }

    table
}

/// Create a table for displaying author counts
pub fn author_table(authors: &[AuthorStat]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Author").fg(Color::Cyan),
        Cell::new("Mentions").fg(Color::Cyan),
    ]);

    for author in authors {
        table.add_row(vec![Cell::new(&author.author), Cell::new(author.count)]);
    }

    table
}

/// Create a table for the keyword catalog, marking selected keywords
pub fn keyword_table(keywords: &[Keyword], filter: &FilterSelection) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Keyword").fg(Color::Cyan),
        Cell::new("Mentions").fg(Color::Cyan),
        Cell::new("Selected").fg(Color::Cyan),
    ]);

    for keyword in keywords {
        let selected = if filter.keywords.contains(&keyword.label) {
            "●"
        } else {
            ""
        };
        table.add_row(vec![
            Cell::new(&keyword.label),
            Cell::new(keyword.count),
            Cell::new(selected).fg(Color::Green),
        ]);
    }

    table
}

/// Create a table for displaying rules in list order
pub fn rule_table(
    rules: &[Rule],
    active: Option<RuleId>,
    last_result: impl Fn(RuleId) -> Option<RuleResult>,
) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Chaining").fg(Color::Cyan),
        Cell::new("Last Run").fg(Color::Cyan),
        Cell::new("Active").fg(Color::Cyan),
    ]);

    for rule in rules {
        let (status, color) = match last_result(rule.id) {
            Some(RuleResult::Ok(_)) => ("ok", Color::Green),
            Some(RuleResult::Error { .. }) => ("error", Color::Red),
            None => ("-", Color::DarkGrey),
        };
        let active_marker = if active == Some(rule.id) { "●" } else { "" };

        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(&rule.title),
            Cell::new(if rule.is_chaining { "yes" } else { "no" }),
            Cell::new(status).fg(color),
            Cell::new(active_marker).fg(Color::Green),
        ]);
    }

    table
}

/// Create a table from rule result rows
pub fn result_table(result: &ResultTable) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(
        result
            .headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    for row in &result.rows {
        table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }

    table
}

/// Render highlighted spans as colored terminal text
pub fn render_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span.kind {
            Some(HighlightKind::Keyword) => span.text.yellow().bold().to_string(),
            Some(HighlightKind::Extracted) => span.text.cyan().underline().to_string(),
            None => span.text.clone(),
        })
        .collect()
}

/// Display the current filter selection
pub fn display_filter(filter: &FilterSelection, unique_authors: Option<u64>) {
    println!("{}: {}", "Filter".bold(), filter.describe());
    if let Some(count) = unique_authors {
        println!("{}: {count}", "Unique authors".bold());
    }
}

/// Display mention details with keyword and extracted-field highlighting
pub fn display_mention_details(mention: &Mention, filter: &FilterSelection) {
    println!("{}", "═".repeat(60).dimmed());
    println!(
        "{} {} {}",
        mention.author_display().cyan().bold(),
        format!("#{}", mention.id).dimmed(),
        format!("[{}]", source_label(&mention.source.to_lowercase())).yellow()
    );
    println!("{}", "═".repeat(60).dimmed());
    println!();

    let spans = highlight(
        mention.content_text(),
        filter.active_keywords(),
        mention.extracted_data.as_ref(),
    );
    println!("{}", render_spans(&spans));
    println!();

    if let Some(date) = &mention.date {
        println!("{}: {date}", "Received".bold());
    }
    println!(
        "{}: {}",
        "Sentiment".bold(),
        sentiment_colored(&mention.sentiment)
    );
    if let Some(url) = &mention.url {
        println!("{}: {url}", "URL".bold());
    }

    if let Some(extracted) = mention.extracted_data.as_ref().filter(|d| !d.is_empty()) {
        println!();
        println!("{}", "Extracted".bold().underline());
        for (key, value) in extracted {
            let text = value
                .as_str()
                .map_or_else(|| value.to_string(), str::to_string);
            println!("  {} {}: {text}", "•".dimmed(), key.replace('_', " "));
        }
    }

    println!();
}

/// Display one rule's result
pub fn display_rule_result(rule: &Rule, result: &RuleResult) {
    println!(
        "{} {} {}",
        "Rule".cyan().bold(),
        rule.id.to_string().cyan().bold(),
        rule.title.bold()
    );

    match result {
        RuleResult::Error { message } => print_error(message),
        RuleResult::Ok(output) => {
            if let Some(message) = &output.message {
                println!("{message}");
            }
            let table = ResultTable::from_rows(result.rows());
            if !table.is_empty() {
                println!("{}", result_table(&table));
            } else if output.message.is_none() {
                print_info("No rows returned");
            }
            if let Some(explanation) = &output.explanation {
                println!();
                println!("{}", "Explanation".bold().underline());
                println!("{explanation}");
            }
            if let Some(sql) = &output.sql {
                println!();
                println!("{}", "SQL".bold().underline());
                println!("{}", sql.dimmed());
            }
        }
    }
    println!();
}

/// Display daily counts and sentiment totals
pub fn display_stats(counts: &[DailyCount], sentiment: &SentimentBreakdown) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Mentions").fg(Color::Cyan),
    ]);
    for day in counts {
        table.add_row(vec![Cell::new(&day.date), Cell::new(day.count)]);
    }
    println!("{table}");

    if !sentiment.is_empty() {
        println!();
        println!("{}", "Sentiment".bold().underline());
        for (label, count) in sentiment {
            println!("  {}: {count}", sentiment_colored(label));
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
