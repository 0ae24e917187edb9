//! Review summary rendering.
//!
//! This module renders section states as terminal text, Markdown or JSON.
//! Layout rules shared by all formats: the average carries exactly one
//! fractional digit, zero reviews show "No Ratings" instead of an average,
//! and a tag bar is `percent / 100 * tag_bar_max_width` pixels wide.

use crate::config::Config;
use crate::models::{ReviewSummary, SectionState, TagStat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Placeholder rows shown for tags while loading.
const PLACEHOLDER_TAG_ROWS: usize = 6;

/// Placeholder width, in cells, of a loading tag row.
const PLACEHOLDER_TAG_CELLS: usize = 12;

const STAR: &str = "★";
const USER: &str = "👤";
const BAR_CELL: &str = "█";
const PLACEHOLDER_CELL: &str = "░";

/// A section's state together with what it was for.
#[derive(Debug, Clone)]
pub struct SectionReport {
    pub coaster_url: String,
    pub fetched_at: DateTime<Utc>,
    pub state: SectionState,
}

/// Settings that affect rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Width in pixels of a bar at 100%.
    pub tag_bar_max_width: f64,
    /// Pixels per terminal cell.
    pub pixels_per_cell: f64,
    /// Top of the rating scale, shown as "out of N".
    pub rating_max: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tag_bar_max_width: 100.0,
            pixels_per_cell: 4.0,
            rating_max: 5.0,
        }
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            tag_bar_max_width: config.display.tag_bar_max_width,
            pixels_per_cell: config.display.pixels_per_cell,
            rating_max: config.aggregation.rating_max,
        }
    }
}

impl RenderOptions {
    /// Number of terminal cells for a tag's bar.
    fn bar_cells(&self, tag: &TagStat) -> usize {
        let cells = tag.bar_width(self.tag_bar_max_width) / self.pixels_per_cell;
        cells.round().max(0.0) as usize
    }
}

/// Format an average rating with one fractional digit, rounding halves up.
///
/// Rounding works on the exact stored value, so a mean such as 87/20 that
/// sits just below 4.35 shows as "4.3". The only exact halves at one digit
/// are odd multiples of 0.25; `{:.1}` would round those to even.
pub fn format_rating(average: f64) -> String {
    let quarters = average * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return format!("{:.1}", (average * 10.0).round() / 10.0);
    }
    format!("{:.1}", average)
}

/// Escape a value for use inside a Markdown table cell.
fn escape_table_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Format a count with thousands separators.
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Format the scale maximum without a trailing ".0".
fn format_scale(max: f64) -> String {
    if max.fract() == 0.0 {
        format!("{}", max as i64)
    } else {
        format!("{}", max)
    }
}

/// The rating half of the stats line.
fn rating_text(summary: &ReviewSummary, options: &RenderOptions) -> String {
    if summary.has_ratings() {
        format!(
            "{} out of {}",
            format_rating(summary.average_rating),
            format_scale(options.rating_max)
        )
    } else {
        "No Ratings".to_string()
    }
}

fn count_text(summary: &ReviewSummary) -> String {
    format!("{} reviews", format_count(summary.count))
}

/// Render sections for a terminal.
pub fn generate_text_report(sections: &[SectionReport], options: &RenderOptions) -> String {
    sections
        .iter()
        .map(|section| generate_text_section(section, options))
        .collect::<Vec<_>>()
        .join("\n")
}

fn generate_text_section(section: &SectionReport, options: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", section.coaster_url));

    match &section.state {
        SectionState::Loading => {
            out.push_str(&format!("{} …  |  {} …\n", STAR, USER));
            for _ in 0..PLACEHOLDER_TAG_ROWS {
                out.push_str(&format!(
                    "  {}\n",
                    PLACEHOLDER_CELL.repeat(PLACEHOLDER_TAG_CELLS)
                ));
            }
        }
        SectionState::Failed(message) => {
            out.push_str(&format!("{} Could not load reviews: {}\n", STAR, message));
        }
        SectionState::Loaded(summary) => {
            out.push_str(&format!(
                "{} {}  |  {} {}\n",
                STAR,
                rating_text(summary, options),
                USER,
                count_text(summary)
            ));

            let name_width = summary
                .tag_stats
                .iter()
                .map(|t| t.name.chars().count())
                .max()
                .unwrap_or(0);

            for tag in &summary.tag_stats {
                out.push_str(&format!(
                    "  {:<width$}  {:>6}  {}\n",
                    tag.name,
                    format!("({}%)", tag.percent),
                    BAR_CELL.repeat(options.bar_cells(tag)),
                    width = name_width
                ));
            }
        }
    }

    out
}

/// Render sections as a Markdown document.
pub fn generate_markdown_report(sections: &[SectionReport], options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("# Coaster Review Summary\n\n");

    for section in sections {
        output.push_str(&generate_markdown_section(section, options));
    }

    output.push_str(&generate_footer(sections));

    output
}

fn generate_markdown_section(section: &SectionReport, options: &RenderOptions) -> String {
    let mut md = String::new();

    md.push_str(&format!("## {}\n\n", section.coaster_url));

    match &section.state {
        SectionState::Loading => {
            md.push_str("*Loading reviews…*\n\n");
        }
        SectionState::Failed(message) => {
            md.push_str(&format!("> ⚠️ **Could not load reviews:** {}\n\n", message));
        }
        SectionState::Loaded(summary) => {
            let rating = if summary.has_ratings() {
                format!(
                    "**{} {}** out of {}",
                    STAR,
                    format_rating(summary.average_rating),
                    format_scale(options.rating_max)
                )
            } else {
                format!("{} No Ratings", STAR)
            };
            md.push_str(&format!(
                "{} · {} **{}** reviews\n\n",
                rating,
                USER,
                format_count(summary.count)
            ));

            if !summary.tag_stats.is_empty() {
                md.push_str("| Tag | Reviewers | Bar |\n");
                md.push_str("|:---|:---:|:---|\n");
                for tag in &summary.tag_stats {
                    md.push_str(&format!(
                        "| {} | {}% | `{}` |\n",
                        escape_table_cell(&tag.name),
                        tag.percent,
                        BAR_CELL.repeat(options.bar_cells(tag))
                    ));
                }
                md.push('\n');
            }
        }
    }

    md
}

fn generate_footer(sections: &[SectionReport]) -> String {
    let latest = sections.iter().map(|s| s.fetched_at).max();

    match latest {
        Some(at) => format!(
            "---\n\n*Fetched {}*\n",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => String::new(),
    }
}

#[derive(Debug, Serialize)]
struct JsonSection<'a> {
    coaster_url: &'a str,
    fetched_at: DateTime<Utc>,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<JsonSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    average_rating: Option<f64>,
    rating_label: String,
    tags: Vec<JsonTag<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonTag<'a> {
    name: &'a str,
    percent: u32,
    bar_width: f64,
    tooltip: String,
}

fn json_section<'a>(section: &'a SectionReport, options: &RenderOptions) -> JsonSection<'a> {
    let (state, error, summary) = match &section.state {
        SectionState::Loading => ("loading", None, None),
        SectionState::Failed(message) => ("failed", Some(message.as_str()), None),
        SectionState::Loaded(summary) => {
            let tags = summary
                .tag_stats
                .iter()
                .map(|tag| JsonTag {
                    name: &tag.name,
                    percent: tag.percent,
                    bar_width: tag.bar_width(options.tag_bar_max_width),
                    tooltip: tag.tooltip(),
                })
                .collect();

            let json_summary = JsonSummary {
                count: summary.count,
                average_rating: summary.has_ratings().then_some(summary.average_rating),
                rating_label: rating_text(summary, options),
                tags,
            };
            ("loaded", None, Some(json_summary))
        }
    };

    JsonSection {
        coaster_url: &section.coaster_url,
        fetched_at: section.fetched_at,
        state,
        error,
        summary,
    }
}

/// Render sections as a JSON array.
pub fn generate_json_report(sections: &[SectionReport], options: &RenderOptions) -> Result<String> {
    let views: Vec<JsonSection<'_>> = sections
        .iter()
        .map(|section| json_section(section, options))
        .collect();

    serde_json::to_string_pretty(&views).map_err(Into::into)
}
