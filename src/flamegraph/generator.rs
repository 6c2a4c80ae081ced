//! SVG rendering of a flame scene and a terminal hot-stack summary.
//!
//! The SVG mirrors what the interactive view draws: same rectangles, same
//! name colors, search highlights and the selection border. Rows keep the
//! orientation chosen at layout time (root at the bottom unless the stack
//! order is reversed).

use super::color::{ColorClass, Rgba, BACKGROUND, SEARCH_MATCH, TEXT};
use super::scene::Scene;
use crate::aggregator::HotStack;
use crate::utils::error::RenderError;
use crate::utils::format::{format_mb, format_size};
use log::info;

/// Space above the graph reserved for the title
const TITLE_HEIGHT: f64 = 40.0;
const LEGEND_HEIGHT: f64 = 50.0;

/// SVG rendering options
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    /// Subtitle line, usually the search term or stack order
    pub subtitle: Option<String>,
    pub legend: bool,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Memory Allocation Flame Graph".to_string(),
            subtitle: None,
            legend: true,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }
}

/// Render a laid-out scene as a standalone SVG document
pub fn generate_flamegraph(scene: &Scene, config: Option<&FlamegraphConfig>) -> Result<String, RenderError> {
    let bounds = match scene.bounds() {
        Some(bounds) if !scene.is_empty() => bounds,
        _ => return Err(RenderError::EmptyGraph),
    };

    let config = config.cloned().unwrap_or_default();
    info!("Rendering flame graph with {} rectangles", scene.len());

    let width = bounds.width;
    let legend_height = if config.legend { LEGEND_HEIGHT } else { 0.0 };
    let total_height = TITLE_HEIGHT + bounds.height + legend_height;
    // scene y to svg y
    let offset_y = TITLE_HEIGHT - bounds.y;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
        w = width,
        h = total_height
    ));
    svg.push_str(
        r#"<style>.func { font: 11px Arial, sans-serif; } .func:hover { stroke-width: 1.5; cursor: pointer; opacity: 0.9; }</style>"#,
    );
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{:.0}" height="{:.0}" fill="{}"/>"#,
        width,
        total_height,
        BACKGROUND.to_css()
    ));

    svg.push_str(&format!(
        r#"<text x="{:.0}" y="20" font-size="16" text-anchor="middle" font-weight="bold" fill="{}">{}</text>"#,
        width / 2.0,
        TEXT.to_css(),
        escape_xml(&config.title)
    ));
    if let Some(subtitle) = &config.subtitle {
        svg.push_str(&format!(
            r#"<text x="{:.0}" y="34" font-size="11" text-anchor="middle" fill="{}">{}</text>"#,
            width / 2.0,
            TEXT.to_css(),
            escape_xml(subtitle)
        ));
    }

    for item in scene.items() {
        let y = item.y + offset_y;
        svg.push_str(&format!(
            r#"<g class="func"><title>{}</title><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.0}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            escape_xml(&item.tooltip),
            item.x,
            y,
            item.width,
            item.height,
            item.fill.to_css(),
            item.pen.color().to_css(),
            item.pen.width()
        ));
        if let Some(label) = &item.label {
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" dx="4" dy="15" fill="{}" pointer-events="none">{}</text>"#,
                item.x,
                y,
                TEXT.to_css(),
                escape_xml(label)
            ));
        }
        svg.push_str("</g>");
    }

    if config.legend {
        render_legend(&mut svg, TITLE_HEIGHT + bounds.height + 30.0);
    }

    svg.push_str("</svg>");

    info!("Flame graph rendered ({} bytes)", svg.len());
    Ok(svg)
}

fn render_legend(out: &mut String, legend_y: f64) {
    out.push_str(&format!(
        r#"<text x="10" y="{:.0}" font-size="13" font-weight="bold" fill="{}">Legend:</text>"#,
        legend_y,
        TEXT.to_css()
    ));

    let items: [(&str, Rgba); 4] = [
        ("Error", super::color::ERROR),
        ("Warning", super::color::WARNING),
        ("Success", super::color::SUCCESS),
        ("Search match", SEARCH_MATCH),
    ];

    for (i, (label, color)) in items.iter().enumerate() {
        let x = 80 + i * 130;
        out.push_str(&format!(
            r#"<rect x="{}" y="{:.0}" width="15" height="15" fill="{}" rx="2"/>"#,
            x,
            legend_y - 12.0,
            color.to_css()
        ));
        out.push_str(&format!(
            r#"<text x="{}" y="{:.0}" font-size="12" fill="{}">{}</text>"#,
            x + 20,
            legend_y,
            TEXT.to_css(),
            label
        ));
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn ansi_color(name: &str) -> &'static str {
    match ColorClass::from_name(name) {
        ColorClass::Error => "\x1b[31;1m",
        ColorClass::Warning => "\x1b[33m",
        ColorClass::Success => "\x1b[32m",
        ColorClass::Hashed(hue) => match hue / 60 {
            0 | 5 => "\x1b[35m",
            1 | 2 => "\x1b[36m",
            _ => "\x1b[34m",
        },
    }
}

/// Table of the heaviest stacks plus a bar chart of the top five
pub fn generate_text_summary(hot_stacks: &[HotStack], max_lines: usize, total_stacks: usize) -> String {
    let reset = "\x1b[0m";
    let mut lines = Vec::new();

    lines.push("  HOT ALLOCATION STACKS".to_string());
    lines.push(format!("  ┏{}┳{}┳{}┳{}┓", "━".repeat(44), "━".repeat(14), "━".repeat(9), "━".repeat(9)));
    lines.push(format!(
        "  ┃ {:<42} ┃ {:^12} ┃ {:^7} ┃ {:^7} ┃",
        "Call Stack (Heaviest First)", "SIZE", "ALLOCS", "%"
    ));
    lines.push(format!("  ┣{}╋{}╋{}╋{}┫", "━".repeat(44), "━".repeat(14), "━".repeat(9), "━".repeat(9)));

    for stack in hot_stacks.iter().take(max_lines) {
        let leaf = stack.call_path.rsplit(" -> ").next().unwrap_or(&stack.call_path);
        let chars: Vec<char> = stack.call_path.chars().collect();
        let display = if chars.len() > 42 {
            format!("...{}", chars[chars.len() - 39..].iter().collect::<String>())
        } else {
            stack.call_path.clone()
        };

        lines.push(format!(
            "  ┃ {}{:<42}{} ┃ {:>12} ┃ {:>7} ┃ {:>6.1}% ┃",
            ansi_color(leaf),
            display,
            reset,
            format_size(stack.size),
            stack.allocations,
            stack.percentage
        ));
    }

    lines.push(format!("  ┗{}┻{}┻{}┻{}┛", "━".repeat(44), "━".repeat(14), "━".repeat(9), "━".repeat(9)));

    lines.push(String::new());
    lines.push("  SIZE BY STACK".to_string());
    for stack in hot_stacks.iter().take(5) {
        let leaf = stack.call_path.rsplit(" -> ").next().unwrap_or(&stack.call_path);
        let bar = "█".repeat((stack.percentage / 2.0) as usize);
        let color = ansi_color(leaf);
        lines.push(format!(
            "  └─ {}{:<20}{} {}{:50}{} {:>9}",
            color,
            leaf,
            reset,
            color,
            bar,
            reset,
            format_mb(stack.size)
        ));
    }

    if total_stacks > max_lines {
        lines.push(String::new());
        lines.push(format!("   (Showing top {} of {} stacks)", max_lines, total_stacks));
    }

    lines.join("\n")
}
