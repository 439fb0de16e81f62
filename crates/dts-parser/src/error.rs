use std::{io, path::PathBuf};

use itertools::Itertools as _;
use thiserror::Error;

use crate::{string::StringParseError, SourceId};

/// A node block or the nesting of blocks is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("node `{0}` is not closed before end of input (missing `}};`)")]
    UnclosedNode(String),
    #[error("nesting is deeper than {0} levels")]
    DepthExceeded(usize),
}

/// A statement or a value doesn't follow the grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("missing terminating semicolon")]
    MissingSemicolon,
    #[error("couldn't understand the line")]
    UnrecognizedLine,
    #[error("property has `=` but no value")]
    EmptyValue,
    #[error("property name is empty")]
    EmptyPropertyName,
    #[error("invalid integer literal `{0}`")]
    InvalidInteger(String),
    #[error("invalid byte `{0}` in byte array")]
    InvalidByte(String),
    #[error("invalid node name `{0}`")]
    InvalidNodeName(String),
    #[error("invalid node address `{0}`")]
    InvalidAddress(String),
    #[error("unterminated `{0}` delimiter")]
    Unterminated(char),
    #[error("unexpected text `{0}` between values")]
    UnexpectedText(String),
    #[error("invalid string: {0}")]
    String(#[from] StringParseError),
    #[error("malformed `{0}` directive")]
    MalformedDirective(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("missing `/dts-v1/;` tag before the first node")]
    MissingTag,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncludeError {
    #[error("could not find `{name}` in [{}]", .search_path.iter().map(|path| path.display()).join(", "))]
    NotFound {
        name: String,
        search_path: Vec<PathBuf>,
    },
}

/// An inline arithmetic expression couldn't be evaluated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("unexpected `{0}` in expression")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("invalid literal `{0}` in expression")]
    InvalidLiteral(String),
    #[error("arithmetic overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("negative exponent")]
    NegativeExponent,
    #[error("invalid shift amount {0}")]
    InvalidShift(i64),
    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
    #[error("expression `{0}` is not separated from the neighboring cells")]
    Unseparated(String),
}

/// The category of a [`ParseError`].
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("version error: {0}")]
    Version(#[from] VersionError),
    #[error("include error: {0}")]
    Include(#[from] IncludeError),
    #[error("expression error: {0}")]
    Expression(#[from] ExprError),
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// A fatal error with the location it was raised at.
///
/// Errors from included files keep the location inside the included file.
#[derive(Debug, Error)]
#[error("{source_id}:{line_number}: {kind}\n    {line}")]
pub struct ParseError {
    /// Name of the file or stream
    pub source_id: SourceId,
    /// 1-based physical line number, 0 when no line was read yet
    pub line_number: usize,
    /// The offending line after comment removal
    pub line: String,
    kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(
        source_id: SourceId,
        line_number: usize,
        line: impl Into<String>,
        kind: impl Into<ParseErrorKind>,
    ) -> Self {
        Self {
            source_id,
            line_number,
            line: line.into(),
            kind: kind.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn into_kind(self) -> ParseErrorKind {
        self.kind
    }
}
