use std::io::BufRead;

use crate::{LineSource, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comment {
    Line,
    Block,
}

/// Finds the earliest comment opener in `line`.
fn find_comment(line: &str) -> Option<(usize, Comment)> {
    let line_comment = line.find("//").map(|idx| (idx, Comment::Line));
    let block_comment = line.find("/*").map(|idx| (idx, Comment::Block));
    match (line_comment, block_comment) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Skips to the end of a block comment whose body starts at `text`, reading further lines from
/// `source` as needed.
///
/// Returns the text following `*/`, or `None` if the input ended inside the comment.
fn skip_block_comment<R: BufRead>(
    text: &str,
    source: &mut LineSource<R>,
) -> Result<Option<String>, ParseError> {
    let mut text = text.to_owned();
    loop {
        if let Some(end) = text.find("*/") {
            return Ok(Some(text[end + 2..].to_owned()));
        }
        text = source.read_line()?;
        if text.is_empty() {
            return Ok(None);
        }
    }
}

/// Removes comments and preprocessor line markers from `line` and trims it.
///
/// Block comments may span several lines, which are consumed from `source`. Reaching the end of
/// input inside a block comment isn't an error here: the text before the comment is returned and
/// the caller notices the missing input.
///
/// # Errors
///
/// Only fails when reading a continuation line fails.
pub fn clean_line<R: BufRead>(line: &str, source: &mut LineSource<R>) -> Result<String, ParseError> {
    if line.starts_with("# ") {
        return Ok(String::new());
    }

    let mut kept = Vec::new();
    let mut rest = line.to_owned();
    loop {
        match find_comment(&rest) {
            None => {
                kept.push(rest);
                break;
            }
            Some((idx, Comment::Line)) => {
                kept.push(rest[..idx].to_owned());
                break;
            }
            Some((idx, Comment::Block)) => {
                kept.push(rest[..idx].to_owned());
                match skip_block_comment(&rest[idx + 2..], source)? {
                    Some(after) => rest = after,
                    None => break,
                }
            }
        }
    }

    Ok(kept.join(" ").trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(text: &str) -> (String, String) {
        let mut src = LineSource::new(text.as_bytes(), "test.dts".into());
        let first = src.read_line().unwrap();
        let cleaned = clean_line(&first, &mut src).unwrap();
        let next = src.read_line().unwrap();
        (cleaned, next)
    }

    #[test]
    fn plain_line_is_trimmed() {
        assert_eq!(clean("  foo = <1>;  \nnext\n").0, "foo = <1>;");
    }

    #[test]
    fn line_comment() {
        assert_eq!(clean("foo; // comment /* not a block\n").0, "foo;");
        assert_eq!(clean("// only a comment\n").0, "");
    }

    #[test]
    fn block_comment_on_one_line() {
        assert_eq!(clean("a /* b */ c /* d */;\n").0, "a   c  ;");
        assert_eq!(clean("a /* b // c */ d\n").0, "a   d");
    }

    #[test]
    fn block_comment_across_lines() {
        let (cleaned, next) = clean("foo /* first\n * middle\n end */ bar;\nbaz\n");
        assert_eq!(cleaned, "foo   bar;");
        assert_eq!(next, "baz\n");
    }

    #[test]
    fn unterminated_block_comment() {
        let (cleaned, next) = clean("foo { /* never\n closed\n");
        assert_eq!(cleaned, "foo {");
        assert_eq!(next, "");
    }

    #[test]
    fn preprocessor_line_marker() {
        assert_eq!(clean("# 1 \"board.dts\"\n").0, "");
        assert_eq!(clean("#address-cells = <1>;\n").0, "#address-cells = <1>;");
    }
}
