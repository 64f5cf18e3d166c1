//! Delimiter-based scanning over response text.
//!
//! Used for response preambles such as `* 12 FETCH` and `* SEARCH 1 2 3`,
//! where the grammar is a handful of words separated by spaces.

/// Forward-only cursor that splits input at caller-supplied delimiters.
///
/// Runs of delimiters collapse, so `a  b` yields `a` then `b`. After a
/// token is returned, [`position`](Self::position) points just past the
/// delimiter that ended it.
#[derive(Debug, Clone, Default)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Resets the cursor to the start of `input` and returns the first
    /// token.
    pub fn init(&mut self, input: &'a [u8], delimiters: &[u8]) -> &'a [u8] {
        self.input = input;
        self.pos = 0;
        self.next(delimiters)
    }

    /// Returns the next token, or an empty slice once input is exhausted.
    pub fn next(&mut self, delimiters: &[u8]) -> &'a [u8] {
        let is_delimiter = |b: &u8| delimiters.contains(b);

        let rest = &self.input[self.pos..];
        let start = self.pos + rest.iter().position(|b| !is_delimiter(b)).unwrap_or(rest.len());

        let rest = &self.input[start..];
        match rest.iter().position(is_delimiter) {
            Some(len) => {
                self.pos = start + len + 1;
                &self.input[start..start + len]
            }
            None => {
                self.pos = self.input.len();
                rest
            }
        }
    }

    /// Returns the current offset into the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the unconsumed remainder of the input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }
}
