//! Rich terminal rendering: ANSI colors with box-drawing tree guides.

use super::{Line, Node, Style};

/// Width of the rule line drawn above each load balancer.
const RULE_WIDTH: usize = 100;

const RESET: &str = "\x1b[0m";

pub fn render(tree: &Node, title: Line) -> String {
    let mut out = String::new();
    out.push_str(&rule(&title));
    out.push('\n');

    out.push_str(&styled_line(&tree.line));
    out.push('\n');
    render_children(&tree.children, "", &mut out);
    out
}

/// Center the title in a `─` rule, like the console rule of the rich library.
fn rule(title: &Line) -> String {
    let text_width = title.text().chars().count() + 2;
    let fill = RULE_WIDTH.saturating_sub(text_width);
    let left = fill / 2;
    let right = fill - left;
    format!(
        "{} {} {}",
        "─".repeat(left),
        styled_line(title),
        "─".repeat(right)
    )
}

fn render_children(children: &[Node], prefix: &str, out: &mut String) {
    for (index, child) in children.iter().enumerate() {
        let last = index == children.len() - 1;
        let guide = if last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(guide);
        out.push_str(&styled_line(&child.line));
        out.push('\n');

        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_children(&child.children, &child_prefix, out);
    }
}

fn styled_line(line: &Line) -> String {
    let mut out = String::new();
    for span in &line.spans {
        match span.style {
            Style::Default => out.push_str(&span.text),
            style => {
                out.push_str(style.ansi());
                out.push_str(&span.text);
                out.push_str(RESET);
            }
        }
    }
    out
}
