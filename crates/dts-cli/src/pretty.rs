//! Indented DTS-like dump of a parsed node forest.

use std::fmt::{self, Write};

use dts_parser::{Node, Tree, Value};
use itertools::Itertools as _;

const INDENT: &str = "\t";

/// Renders `tree` with nodes and properties in sorted order.
pub fn write_tree(tree: &Tree, out: &mut impl Write) -> fmt::Result {
    for node in tree.values() {
        write_node_rec(node, 0, out)?;
    }
    Ok(())
}

fn write_node_rec(node: &Node, level: usize, out: &mut impl Write) -> fmt::Result {
    let indent = INDENT.repeat(level);
    write!(out, "{indent}")?;
    if let Some(label) = &node.label {
        write!(out, "{label}: ")?;
    }
    writeln!(out, "{} {{", node.name)?;

    for (name, value) in &node.properties {
        match value {
            Value::Empty => writeln!(out, "{indent}{INDENT}{name};")?,
            value => writeln!(out, "{indent}{INDENT}{name} = {};", render_value(value))?,
        }
    }
    if !node.properties.is_empty() && !node.children.is_empty() {
        writeln!(out)?;
    }
    for child in node.children.values() {
        write_node_rec(child, level + 1, out)?;
    }

    writeln!(out, "{indent}}};")
}

/// Property value as it would be written in source.
///
/// Collapsed single cells get their angle brackets back and a value made of several `<...>`
/// groups is written as a comma-separated list of them.
fn render_value(value: &Value) -> String {
    match value {
        Value::Integer(_) => format!("<{value}>"),
        Value::CellArray(values) if values.iter().any(|v| matches!(v, Value::CellArray(_))) => {
            values
                .iter()
                .map(|group| match group {
                    Value::CellArray(_) => group.to_string(),
                    cell => format!("<{cell}>"),
                })
                .join(", ")
        }
        value => value.to_string(),
    }
}
