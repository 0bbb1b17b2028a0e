//! Output formatting
//!
//! The report is turned into a styled tree once ([`tree`]); the `plain` and
//! `rich` renderers walk that tree, while `json` serializes the raw resource
//! payloads directly.
//!
//! - [`tree`] - Builds the styled node tree from a report
//! - [`plain`] - Indented text without styling
//! - [`rich`] - ANSI colors with box-drawing guides
//! - [`json`] - `type`/`children` document per load balancer

pub mod json;
pub mod plain;
pub mod rich;
pub mod tree;

use crate::resource::{AmphoraReport, LbReport};
use clap::ValueEnum;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Rich,
    Json,
}

impl OutputFormat {
    /// Render the listener/pool/member report for one load balancer.
    pub fn render_lb(&self, report: &LbReport, details: bool) -> String {
        match self {
            OutputFormat::Plain => plain::render(&tree::lb_tree(report, details), rule_title(report)),
            OutputFormat::Rich => rich::render(&tree::lb_tree(report, details), rule_title(report)),
            OutputFormat::Json => json::render_lb(report),
        }
    }

    /// Render the amphora report for one load balancer.
    pub fn render_amphorae(&self, report: &AmphoraReport, details: bool) -> String {
        let title = Line::plain(format!(
            "Loadbalancer ID: {} ({})",
            report.lb.item.id,
            report.lb.item.display_name()
        ));
        match self {
            OutputFormat::Plain => plain::render(&tree::amphora_tree(report, details), title),
            OutputFormat::Rich => rich::render(&tree::amphora_tree(report, details), title),
            OutputFormat::Json => json::render_amphorae(report),
        }
    }

    /// Render a standalone message (e.g. "No load balancer(s) found.").
    pub fn render_message(&self, message: &str) -> String {
        match self {
            OutputFormat::Json => json::render_message(message),
            _ => message.to_string(),
        }
    }
}

fn rule_title(report: &LbReport) -> Line {
    let mut line = Line::default();
    line.push(
        format!("Loadbalancer ID: {} ", report.lb.item.id),
        Style::Bold,
    );
    line.push(
        format!("({})", report.lb.item.display_name()),
        Style::BrightBlue,
    );
    line
}

/// Styling applied to a span of report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Default,
    Bold,
    BoldGreen,
    BoldWhite,
    BoldBlue,
    Green,
    Yellow,
    Red,
    Magenta,
    Cyan,
    BrightCyan,
    BrightYellow,
    BrightBlue,
}

impl Style {
    /// ANSI SGR sequence for this style.
    pub fn ansi(&self) -> &'static str {
        match self {
            Style::Default => "",
            Style::Bold => "\x1b[1m",
            Style::BoldGreen => "\x1b[1;32m",
            Style::BoldWhite => "\x1b[1;37m",
            Style::BoldBlue => "\x1b[1;34m",
            Style::Green => "\x1b[32m",
            Style::Yellow => "\x1b[33m",
            Style::Red => "\x1b[31m",
            Style::Magenta => "\x1b[35m",
            Style::Cyan => "\x1b[36m",
            Style::BrightCyan => "\x1b[96m",
            Style::BrightYellow => "\x1b[93m",
            Style::BrightBlue => "\x1b[94m",
        }
    }
}

/// Color for a provisioning/operating status value.
///
/// `PENDING` is matched by prefix so that the transitional statuses
/// (PENDING_CREATE, PENDING_UPDATE, PENDING_DELETE) all show as yellow.
pub fn status_style(status: &str) -> Style {
    match status {
        "ACTIVE" | "ONLINE" => Style::Green,
        s if s.starts_with("PENDING") => Style::Yellow,
        _ => Style::Red,
    }
}

/// One styled fragment of a report line.
#[derive(Debug, Clone)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

/// A report line made of styled fragments.
#[derive(Debug, Clone, Default)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn plain(text: impl Into<String>) -> Self {
        let mut line = Self::default();
        line.push(text, Style::Default);
        line
    }

    pub fn push(&mut self, text: impl Into<String>, style: Style) -> &mut Self {
        self.spans.push(Span {
            text: text.into(),
            style,
        });
        self
    }

    /// The unstyled text of the line.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A node in the report tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub line: Line,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(line: Line) -> Self {
        Self {
            line,
            children: Vec::new(),
        }
    }

    pub fn add(&mut self, child: Node) -> &mut Node {
        self.children.push(child);
        self.children.last_mut().unwrap()
    }
}
