use std::{iter::Peekable, str::Chars};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringParseError {
    #[error("escape at end of string")]
    EscapeAtEndOfString,
    #[error("hex escape with no valid digits")]
    HexNoDigits,
}

struct InterpretEscapedString<'a> {
    s: Peekable<Chars<'a>>,
}

impl Iterator for InterpretEscapedString<'_> {
    type Item = Result<char, StringParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.s.next().map(|c| match c {
            '\\' => match self.s.next() {
                None => Err(StringParseError::EscapeAtEndOfString),
                Some('a') => Ok('\x07'),
                Some('b') => Ok('\x08'),
                Some('v') => Ok('\x0b'),
                Some('f') => Ok('\x0c'),
                Some('n') => Ok('\n'),
                Some('r') => Ok('\r'),
                Some('t') => Ok('\t'),
                Some('x') => {
                    let Some(mut num) = self.s.next().and_then(|c| c.to_digit(16)) else {
                        return Err(StringParseError::HexNoDigits);
                    };
                    if let Some(second) = self.s.peek().and_then(|c| c.to_digit(16)) {
                        self.s.next();
                        num = num * 16 + second;
                    }

                    Ok(char::from(u8::try_from(num).unwrap_or(u8::MAX)))
                }
                // `\\`, `\"` and unknown escapes stand for themselves
                Some(c) => Ok(c),
            },
            c => Ok(c),
        })
    }
}

/// Interprets C-style escapes in the contents of a string literal.
pub fn interpret_escaped_string(s: &str) -> Result<String, StringParseError> {
    (InterpretEscapedString {
        s: s.chars().peekable(),
    })
    .collect()
}

/// Returns the byte index of the closing `"` of a literal whose contents start at `s`.
pub(crate) fn find_closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(idx),
            _ => {}
        }
    }
    None
}
