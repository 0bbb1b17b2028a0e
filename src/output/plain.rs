//! Plain text rendering: a rule line, then the tree with 4-space indents.

use super::{Line, Node};

pub fn render(tree: &Node, title: Line) -> String {
    let mut out = String::new();
    let title_text = title.text();
    out.push_str(&title_text);
    out.push('\n');
    out.push_str(&"-".repeat(title_text.chars().count()));
    out.push('\n');

    render_node(tree, 0, &mut out);
    out
}

fn render_node(node: &Node, level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str("    ");
    }
    out.push_str(&node.line.text());
    out.push('\n');

    for child in &node.children {
        render_node(child, level + 1, out);
    }
}
