use std::io::BufRead;

use tracing::trace;

use crate::{ParseError, ParseErrorKind, SourceId};

/// Line-oriented reader with a one-fragment push-back buffer.
///
/// The parser over-reads when a node name, its `{` and a body statement share one line. The text
/// after the consumed part is handed back with [`LineSource::unread`] and returned by the next
/// [`LineSource::read_line`].
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    id: SourceId,
    pending: Option<String>,
    line_number: usize,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, id: SourceId) -> Self {
        Self {
            reader,
            id,
            pending: None,
            line_number: 0,
        }
    }

    /// Returns the next line including its trailing newline.
    ///
    /// Returns an empty string at the end of input.
    ///
    /// A pushed-back fragment without a trailing newline is completed with the next physical
    /// line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrorKind::Io`] when reading fails or the input isn't UTF-8.
    pub fn read_line(&mut self) -> Result<String, ParseError> {
        let mut line = self.pending.take().unwrap_or_default();
        if !line.ends_with('\n') {
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|err| self.error(err, ""))?;
            if read != 0 {
                self.line_number += 1;
            }
        }
        Ok(line)
    }

    /// Prepends `text` to what the next [`LineSource::read_line`] returns.
    pub fn unread(&mut self, text: &str) {
        trace!(source = %self.id, text, "Pushing back");
        self.pending.get_or_insert_with(String::new).push_str(text);
    }

    #[must_use]
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// The 1-based number of the last physical line read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Creates an error located at the current line.
    pub fn error(&self, kind: impl Into<ParseErrorKind>, line: &str) -> ParseError {
        ParseError::new(self.id.clone(), self.line_number, line.trim(), kind)
    }
}
