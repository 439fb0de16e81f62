//! Graphviz export of a parsed node forest.
//!
//! Nodes with children become clusters, leaf nodes plain graph nodes, and references found in
//! properties become edges.

use std::fmt::{self, Write};

use dts_parser::{Node, Tree};

const INDENT: &str = "  ";

/// Name shown in the graph: `&label` overrides are displayed as `label`.
fn display_name(node: &Node) -> &str {
    node.name.strip_prefix('&').unwrap_or(&node.name)
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\\\""))
}

#[derive(Debug)]
struct DotExporter<'w, W> {
    out: &'w mut W,
    clusters: usize,
    /// `(from, to)` pairs emitted after all clusters
    edges: Vec<(String, String)>,
}

impl<W: Write> DotExporter<'_, W> {
    fn next_cluster(&mut self) -> usize {
        self.clusters += 1;
        self.clusters
    }

    fn write_level(&mut self, nodes: &Tree, level: usize) -> fmt::Result {
        let indent = INDENT.repeat(level);
        for node in nodes.values() {
            if node.children.is_empty() {
                writeln!(self.out, "{indent}{};", quote(display_name(node)))?;
            } else {
                let cluster = self.next_cluster();
                let name = quote(display_name(node));
                writeln!(self.out, "{indent}subgraph cluster_{cluster} {{")?;
                writeln!(self.out, "{indent}{INDENT}label = {name};")?;
                writeln!(self.out, "{indent}{INDENT}{name};")?;
                self.write_level(&node.children, level + 1)?;
                writeln!(self.out, "{indent}}}")?;
            }
        }

        for node in nodes.values() {
            let from = display_name(node);
            self.edges.extend(
                node.properties
                    .values()
                    .flat_map(|value| value.references())
                    .map(|target| (from.to_owned(), target.to_owned())),
            );
        }
        Ok(())
    }
}

/// Writes `tree` as a `digraph devicetree` in Graphviz dot syntax.
pub fn write_dot(tree: &Tree, out: &mut impl Write) -> fmt::Result {
    let mut exporter = DotExporter {
        out,
        clusters: 0,
        edges: Vec::new(),
    };

    writeln!(exporter.out, "digraph devicetree {{")?;
    exporter.write_level(tree, 1)?;
    for (from, to) in &exporter.edges {
        writeln!(exporter.out, "{INDENT}{} -> {};", quote(from), quote(to))?;
    }
    writeln!(exporter.out, "}}")
}
