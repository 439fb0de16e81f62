//! Recursive-descent parsing of node blocks and property statements.

use std::io::BufRead;

use tracing::debug;

use crate::{
    clean::clean_line, node::merge_into, parse_value, value::parse_hex, LineSource, Node,
    ParseError, StructuralError, SyntaxError, Value,
};

/// Default bound for node nesting and include depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Recursion depth shared by nested nodes and includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Depth {
    level: usize,
    max: usize,
}

impl Depth {
    pub(crate) fn new(max: usize) -> Self {
        Self { level: 0, max }
    }

    pub(crate) fn enter(self) -> Result<Self, StructuralError> {
        if self.level >= self.max {
            return Err(StructuralError::DepthExceeded(self.max));
        }
        Ok(Self {
            level: self.level + 1,
            ..self
        })
    }
}

/// Returns whether `line` opens a node block, i.e. has a `{` not preceded by `=`.
pub(crate) fn opens_node(line: &str) -> bool {
    line.find('{').is_some_and(|idx| !line[..idx].contains('='))
}

/// Returns the byte index of the first `;` outside string literals.
fn find_terminator(text: &str) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            ';' if !in_string => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Hands text following a consumed statement back to `source`.
fn push_back<R: BufRead>(source: &mut LineSource<R>, rest: &str) {
    let rest = rest.trim();
    if !rest.is_empty() {
        source.unread(&format!("{rest}\n"));
    }
}

/// Splits a node header into label, name and address.
///
/// Form: `[label:] name[@address]`.
fn parse_node_name(header: &str) -> Result<(Option<String>, String, Option<u64>), SyntaxError> {
    let invalid_name = || SyntaxError::InvalidNodeName(header.trim().to_owned());

    let (rest, address) = match header.split_once('@') {
        Some((rest, address)) => (rest, Some(address.trim())),
        None => (header, None),
    };
    let (label, name) = match rest.split_once(':') {
        Some((label, name)) => (Some(label.trim()), name.trim()),
        None => (None, rest.trim()),
    };

    // Whitespace or `;` inside a name means a statement ran into the header
    let malformed = |part: &str| {
        part.is_empty() || part.contains(|c: char| c.is_whitespace() || c == ';' || c == ':')
    };
    if malformed(name) || label.is_some_and(malformed) {
        return Err(invalid_name());
    }

    let address = address
        .map(|address| {
            parse_hex(address).ok_or_else(|| SyntaxError::InvalidAddress(address.to_owned()))
        })
        .transpose()?;

    Ok((label.map(str::to_owned), name.to_owned(), address))
}

/// Parses a property statement: `name;` or `name = value;`.
///
/// A value may continue over several lines until its terminating `;`. Text after the `;` is
/// pushed back to `source`.
///
/// # Errors
///
/// Fails with [`SyntaxError::MissingSemicolon`] when no terminator is found, and with any error
/// of [`parse_value`].
pub fn parse_property<R: BufRead>(
    line: &str,
    source: &mut LineSource<R>,
) -> Result<(String, Value), ParseError> {
    let terminator = find_terminator(line);
    let value_start = line
        .find('=')
        .filter(|&eq| terminator.map_or(true, |end| eq < end));
    let Some(eq) = value_start else {
        let end =
            terminator.ok_or_else(|| source.error(SyntaxError::MissingSemicolon, line))?;
        let name = line[..end].trim();
        if name.is_empty() {
            return Err(source.error(SyntaxError::EmptyPropertyName, line));
        }
        push_back(source, &line[end + 1..]);
        return Ok((name.to_owned(), Value::Empty));
    };
    let name = line[..eq].trim();
    if name.is_empty() {
        return Err(source.error(SyntaxError::EmptyPropertyName, line));
    }

    let mut text = line[eq + 1..].to_owned();
    let end = loop {
        if let Some(end) = find_terminator(&text) {
            break end;
        }
        let next = source.read_line()?;
        if next.is_empty() {
            return Err(source.error(SyntaxError::MissingSemicolon, line));
        }
        let next = clean_line(&next, source)?;
        text.push(' ');
        text.push_str(&next);
    };
    push_back(source, &text[end + 1..]);

    let value = parse_value(&text[..end]).map_err(|kind| source.error(kind, line))?;
    Ok((name.to_owned(), value))
}

/// Parses a node block whose header is `line`, consuming its body up to the closing `};`.
///
/// # Errors
///
/// Fails with [`StructuralError::UnclosedNode`] when the input ends before `};` and with
/// [`SyntaxError`]s from the header or body statements.
pub fn parse_node<R: BufRead>(line: &str, source: &mut LineSource<R>) -> Result<Node, ParseError> {
    let depth = Depth::new(DEFAULT_MAX_DEPTH)
        .enter()
        .map_err(|err| source.error(err, line))?;
    parse_node_at(line, source, depth)
}

pub(crate) fn parse_node_at<R: BufRead>(
    line: &str,
    source: &mut LineSource<R>,
    depth: Depth,
) -> Result<Node, ParseError> {
    let (header, rest) = line
        .split_once('{')
        .ok_or_else(|| source.error(SyntaxError::UnrecognizedLine, line))?;
    push_back(source, rest);

    let (label, name, address) =
        parse_node_name(header).map_err(|err| source.error(err, line))?;
    let name = match address {
        Some(address) => format!("{name}@{address:x}"),
        None => name,
    };
    debug!(
        source = %source.id(),
        line = source.line_number(),
        name = %name,
        "Opening node"
    );

    let mut node = Node {
        name,
        label,
        address,
        ..Default::default()
    };

    loop {
        let raw = source.read_line()?;
        if raw.is_empty() {
            return Err(source.error(StructuralError::UnclosedNode(node.name), line));
        }

        let line = clean_line(&raw, source)?;
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("};") {
            push_back(source, rest);
            debug!(name = %node.name, "Closing node");
            return Ok(node);
        }

        if opens_node(&line) {
            let depth = depth.enter().map_err(|err| source.error(err, &line))?;
            let child = parse_node_at(&line, source, depth)?;
            merge_into(&mut node.children, child);
        } else {
            let (key, value) = parse_property(&line, source)?;
            node.properties.insert(key, value);
        }
    }
}
