//! Lexical analysis (tokenization) of a single command line.
//!
//! Splitting is purely on raw delimiter characters: quotes, backslashes and `$`
//! are ordinary characters and end up inside tokens unchanged.

/// Characters that separate tokens: space, tab, carriage return, newline and bell.
pub const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\u{7}'];

fn is_delimiter(ch: char) -> bool {
    DELIMITERS.contains(&ch)
}

/// Lazy iterator over the tokens of a line.
///
/// Every item is a maximal run of non-delimiter characters borrowed from the
/// input, so the tokens cannot outlive the line they were taken from.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    /// Creates a tokenizer positioned at the start of `line`.
    pub fn new(line: &'a str) -> Self {
        Tokens { rest: line }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        // Consecutive delimiters collapse, so skip the whole run first.
        let rest = self.rest.trim_start_matches(is_delimiter);
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        let end = rest.find(is_delimiter).unwrap_or(rest.len());
        let (token, remainder) = rest.split_at(end);
        self.rest = remainder;
        Some(token)
    }
}

/// Splits `line` into its tokens.
///
/// A line made only of delimiters yields an empty vector. The number of tokens
/// is unbounded; the vector grows as needed.
pub fn split_into_tokens(line: &str) -> Vec<&str> {
    Tokens::new(line).collect()
}
