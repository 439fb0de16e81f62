use std::fmt;

use itertools::Itertools as _;

use crate::{
    expr::substitute_expressions,
    string::{find_closing_quote, interpret_escaped_string},
    ParseErrorKind, SyntaxError,
};

/// A typed property value.
///
/// Bracketed forms holding a single element collapse to that element: `<1>` is
/// `Integer(1)` and `"a"` is `String("a")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A property without a value, e.g. `status;`
    Empty,
    /// e.g. `0x10`, `010` (octal) or `16`
    Integer(i64),
    String(String),
    /// e.g. `<1 2 &foo>`
    CellArray(Vec<Value>),
    /// e.g. `"a", "b"`
    StringList(Vec<String>),
    /// e.g. `[01 02 ff]`
    ByteArray(Vec<u8>),
    /// A reference to a labelled node, e.g. `&uart0`
    Reference { target: String },
}

impl Value {
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Iterates over all reference targets in this value, including those inside cell arrays.
    pub fn references(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::Reference { target } => Box::new(std::iter::once(target.as_str())),
            Self::CellArray(values) => Box::new(values.iter().flat_map(Value::references)),
            _ => Box::new(std::iter::empty()),
        }
    }
}

/// Renders DTS-like notation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Integer(n) if *n < 0 => write!(f, "{n}"),
            Self::Integer(n) => write!(f, "{n:#x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::CellArray(values) => write!(f, "<{}>", values.iter().join(" ")),
            Self::StringList(strings) => {
                write!(f, "{}", strings.iter().map(|s| format!("{s:?}")).join(", "))
            }
            Self::ByteArray(bytes) => write!(
                f,
                "[{}]",
                bytes.iter().map(|byte| format!("{byte:02x}")).join(" ")
            ),
            Self::Reference { target } => write!(f, "&{target}"),
        }
    }
}

/// Parses an integer literal: `0x`-prefixed hex, `0`-prefixed octal or decimal, optionally
/// negative.
///
/// # Errors
///
/// Fails on digits invalid for the base and on values outside of [`i64`].
pub fn parse_integer(text: &str) -> Result<i64, SyntaxError> {
    let invalid = || SyntaxError::InvalidInteger(text.to_owned());

    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text),
    };
    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }
    let magnitude = i128::from(u64::from_str_radix(digits, radix).map_err(|_| invalid())?);
    i64::try_from(if negative { -magnitude } else { magnitude }).map_err(|_| invalid())
}

/// Parses hex digits with an optional `0x` prefix, as in unit addresses and `/memreserve/`.
pub(crate) fn parse_hex(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

fn is_numeric(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

/// Collapses a one-element sequence to its element.
fn collapse(values: Vec<Value>) -> Value {
    match <[Value; 1]>::try_from(values) {
        Ok([value]) => value,
        Err(values) => Value::CellArray(values),
    }
}

/// Returns the contents of every `open`...`close` span in `text`.
///
/// Spans may only be separated by whitespace and commas.
fn delimited_spans(text: &str, open: char, close: char) -> Result<Vec<&str>, SyntaxError> {
    let mut spans = Vec::new();
    let mut rest = text;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            return Ok(spans);
        }
        let Some(inner) = rest.strip_prefix(open) else {
            return Err(SyntaxError::UnexpectedText(rest.to_owned()));
        };
        let end = inner.find(close).ok_or(SyntaxError::Unterminated(open))?;
        spans.push(&inner[..end]);
        rest = &inner[end + close.len_utf8()..];
    }
}

/// Parses the tokens of one bracketed span. Tokens can't open another bracketed value.
fn parse_tokens(span: &str) -> Result<Value, ParseErrorKind> {
    Ok(collapse(
        span.split_whitespace()
            .map(|token| {
                if token.starts_with(['<', '[', '"']) {
                    return Err(SyntaxError::UnexpectedText(token.to_owned()).into());
                }
                parse_value(token)
            })
            .collect::<Result<_, _>>()?,
    ))
}

fn parse_cells(text: &str) -> Result<Value, ParseErrorKind> {
    let text = substitute_expressions(text)?;
    let spans = delimited_spans(&text, '<', '>')?;
    Ok(collapse(
        spans
            .into_iter()
            .map(parse_tokens)
            .collect::<Result<_, _>>()?,
    ))
}

fn is_byte(token: &str) -> bool {
    token.len() == 2 && token.chars().all(|c| c.is_ascii_hexdigit())
}

fn parse_byte_span(span: &str) -> Result<Value, ParseErrorKind> {
    let tokens = span.split_whitespace().collect::<Vec<_>>();

    // Two-character tokens other than references must be bytes
    if tokens.iter().all(|token| token.len() == 2) {
        if let Some(token) = tokens
            .iter()
            .find(|token| !token.starts_with('&') && !is_byte(token))
        {
            return Err(SyntaxError::InvalidByte((*token).to_owned()).into());
        }
    }
    if !tokens.iter().copied().all(is_byte) {
        return parse_tokens(span);
    }

    let bytes = tokens
        .iter()
        .map(|token| {
            u8::from_str_radix(token, 16).map_err(|_| SyntaxError::InvalidByte((*token).to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let &[byte] = bytes.as_slice() {
        return Ok(Value::Integer(i64::from(byte)));
    }
    Ok(Value::ByteArray(bytes))
}

fn parse_bytes(text: &str) -> Result<Value, ParseErrorKind> {
    let text = substitute_expressions(text)?;
    let spans = delimited_spans(&text, '[', ']')?;
    Ok(collapse(
        spans
            .into_iter()
            .map(parse_byte_span)
            .collect::<Result<_, _>>()?,
    ))
}

fn parse_strings(text: &str) -> Result<Value, ParseErrorKind> {
    let mut strings = Vec::new();
    let mut rest = text;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }
        let Some(inner) = rest.strip_prefix('"') else {
            return Err(SyntaxError::UnexpectedText(rest.to_owned()).into());
        };
        let end = find_closing_quote(inner).ok_or(SyntaxError::Unterminated('"'))?;
        strings.push(interpret_escaped_string(&inner[..end]).map_err(SyntaxError::from)?);
        rest = &inner[end + 1..];
    }

    Ok(match <[String; 1]>::try_from(strings) {
        Ok([string]) => Value::String(string),
        Err(strings) => Value::StringList(strings),
    })
}

/// Classifies and decodes a property value by its first character.
///
/// | Leading | Result |
/// |---|---|
/// | `<` | cell array, tokens separated by whitespace |
/// | `"` | string list, separated by `,` |
/// | `[` | byte array if every token is two hex digits, else a cell array |
/// | `&` | reference to the rest of the text |
/// | digit | integer |
/// | other | raw string |
///
/// Parenthesized arithmetic inside `<...>` and `[...]` is evaluated before tokenizing.
///
/// # Errors
///
/// Returns [`ParseErrorKind::Syntax`] for malformed values and [`ParseErrorKind::Expression`]
/// for expressions that can't be evaluated.
pub fn parse_value(text: &str) -> Result<Value, ParseErrorKind> {
    let text = text.trim();
    match text.chars().next() {
        None => Err(SyntaxError::EmptyValue.into()),
        Some('<') => parse_cells(text),
        Some('"') => parse_strings(text),
        Some('[') => parse_bytes(text),
        Some('&') => Ok(Value::Reference {
            target: text[1..].trim().to_owned(),
        }),
        Some(_) if is_numeric(text) => Ok(Value::Integer(parse_integer(text)?)),
        Some(_) => Ok(Value::String(text.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExprError;
    use pretty_assertions::assert_eq;

    fn reference(target: &str) -> Value {
        Value::Reference {
            target: target.to_owned(),
        }
    }

    #[test]
    fn integers() {
        assert_eq!(parse_integer("0x10"), Ok(16));
        assert_eq!(parse_integer("0X1f"), Ok(31));
        assert_eq!(parse_integer("010"), Ok(8));
        assert_eq!(parse_integer("0"), Ok(0));
        assert_eq!(parse_integer("42"), Ok(42));
        assert_eq!(parse_integer("-3"), Ok(-3));
        assert_eq!(
            parse_integer("09"),
            Err(SyntaxError::InvalidInteger("09".to_owned()))
        );
        assert_eq!(
            parse_integer("0x"),
            Err(SyntaxError::InvalidInteger("0x".to_owned()))
        );
        assert_eq!(
            parse_integer("12abc"),
            Err(SyntaxError::InvalidInteger("12abc".to_owned()))
        );
        assert_eq!(
            parse_integer("0xffffffffffffffff"),
            Err(SyntaxError::InvalidInteger("0xffffffffffffffff".to_owned()))
        );
    }

    #[test]
    fn hex() {
        assert_eq!(parse_hex("4000"), Some(0x4000));
        assert_eq!(parse_hex("0x1f"), Some(0x1f));
        assert_eq!(parse_hex("0XFF"), Some(0xff));
        for bad in ["", "0x", "+1", "40zz", "0x-1", "1ffffffffffffffff"] {
            assert_eq!(parse_hex(bad), None, "{bad}");
        }
    }

    #[test]
    fn single_cells_collapse() {
        assert_eq!(parse_value("<0x10>").unwrap(), Value::Integer(16));
        assert_eq!(parse_value("<1>").unwrap(), Value::Integer(1));
        assert_eq!(parse_value("<&gpio0>").unwrap(), reference("gpio0"));
        assert_eq!(parse_value("[2a]").unwrap(), Value::Integer(0x2a));
        assert_eq!(parse_value("\"okay\"").unwrap(), Value::String("okay".to_owned()));
    }

    #[test]
    fn cell_arrays() {
        assert_eq!(
            parse_value("<1 2 3>").unwrap(),
            Value::CellArray(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3)
            ])
        );
        assert_eq!(
            parse_value("< &gpio0  5 0x0 >").unwrap(),
            Value::CellArray(vec![reference("gpio0"), Value::Integer(5), Value::Integer(0)])
        );
        assert_eq!(
            parse_value("<SYMBOL 1>").unwrap(),
            Value::CellArray(vec![Value::String("SYMBOL".to_owned()), Value::Integer(1)])
        );
        assert_eq!(
            parse_value("<1 2>, <3>").unwrap(),
            Value::CellArray(vec![
                Value::CellArray(vec![Value::Integer(1), Value::Integer(2)]),
                Value::Integer(3)
            ])
        );
        assert_eq!(parse_value("<>").unwrap(), Value::CellArray(Vec::new()));
    }

    #[test]
    fn expressions_in_cells() {
        assert_eq!(parse_value("<(1+2)>").unwrap(), Value::Integer(3));
        assert_eq!(parse_value("<(2**8)>").unwrap(), Value::Integer(256));
        assert_eq!(
            parse_value("<0x1000 (0x100 * 4) (-1)>").unwrap(),
            Value::CellArray(vec![
                Value::Integer(0x1000),
                Value::Integer(0x400),
                Value::Integer(-1)
            ])
        );
        assert!(matches!(
            parse_value("<(foo+1)>"),
            Err(ParseErrorKind::Expression(ExprError::UnexpectedToken(_)))
        ));
        assert!(matches!(
            parse_value("<(1+2>"),
            Err(ParseErrorKind::Expression(ExprError::UnbalancedParens))
        ));
        assert!(matches!(
            parse_value("<(1)(2)>"),
            Err(ParseErrorKind::Expression(ExprError::Unseparated(_)))
        ));
    }

    #[test]
    fn nested_values_are_rejected() {
        let negations = format!("<({}1)>", "-".repeat(10_000));
        assert!(matches!(
            parse_value(&negations),
            Err(ParseErrorKind::Expression(ExprError::TooDeep(_)))
        ));
        let parens = format!("<{}1{}>", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(
            parse_value(&parens),
            Err(ParseErrorKind::Expression(ExprError::TooDeep(_)))
        ));
        for text in ["<<1>", "<\"a\" 1>", "[01 [02]"] {
            assert!(
                matches!(
                    parse_value(text),
                    Err(ParseErrorKind::Syntax(SyntaxError::UnexpectedText(_)))
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn strings() {
        assert_eq!(
            parse_value(r#""a", "b""#).unwrap(),
            Value::StringList(vec!["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(
            parse_value(r#""ns16550a","uart""#).unwrap(),
            Value::StringList(vec!["ns16550a".to_owned(), "uart".to_owned()])
        );
        assert_eq!(parse_value(r#""1""#).unwrap(), Value::String("1".to_owned()));
        assert_eq!(
            parse_value(r#""say \"hi\", ok""#).unwrap(),
            Value::String("say \"hi\", ok".to_owned())
        );
        assert_eq!(parse_value(r#""""#).unwrap(), Value::String(String::new()));
        assert!(matches!(
            parse_value(r#""open"#),
            Err(ParseErrorKind::Syntax(SyntaxError::Unterminated('"')))
        ));
        assert!(matches!(
            parse_value(r#""a" junk"#),
            Err(ParseErrorKind::Syntax(SyntaxError::UnexpectedText(_)))
        ));
    }

    #[test]
    fn byte_arrays() {
        assert_eq!(
            parse_value("[01 02 ff]").unwrap(),
            Value::ByteArray(vec![0x01, 0x02, 0xff])
        );
        assert_eq!(parse_value("[]").unwrap(), Value::ByteArray(Vec::new()));
        assert!(matches!(
            parse_value("[01 0g]"),
            Err(ParseErrorKind::Syntax(SyntaxError::InvalidByte(byte))) if byte == "0g"
        ));
        assert!(matches!(
            parse_value("[01 +1]"),
            Err(ParseErrorKind::Syntax(SyntaxError::InvalidByte(_)))
        ));
        assert_eq!(
            parse_value("[&a 01]").unwrap(),
            Value::CellArray(vec![reference("a"), Value::Integer(1)])
        );
        assert!(matches!(
            parse_value("[&a 0g]"),
            Err(ParseErrorKind::Syntax(SyntaxError::InvalidByte(byte))) if byte == "0g"
        ));
        assert_eq!(
            parse_value("[1 0x20]").unwrap(),
            Value::CellArray(vec![Value::Integer(1), Value::Integer(0x20)])
        );
    }

    #[test]
    fn scalars() {
        assert_eq!(parse_value("&uart0").unwrap(), reference("uart0"));
        assert_eq!(parse_value("0x4000").unwrap(), Value::Integer(0x4000));
        assert_eq!(parse_value("017").unwrap(), Value::Integer(15));
        assert_eq!(parse_value("okay").unwrap(), Value::String("okay".to_owned()));
        assert!(matches!(
            parse_value("  "),
            Err(ParseErrorKind::Syntax(SyntaxError::EmptyValue))
        ));
        assert!(matches!(
            parse_value("<1 2"),
            Err(ParseErrorKind::Syntax(SyntaxError::Unterminated('<')))
        ));
    }

    #[test]
    fn display() {
        for text in ["<0x1 &foo 0x10>", "\"a\", \"b\"", "[01 ff]", "&bar", "0x10", "\"s\""] {
            assert_eq!(parse_value(text).unwrap().to_string(), text);
        }
        assert_eq!(Value::Integer(-1).to_string(), "-1");
        assert_eq!(Value::Empty.to_string(), "");
    }

    #[test]
    fn references() {
        let value = parse_value("<&a 1>, <&b>").unwrap();
        assert_eq!(value.references().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
