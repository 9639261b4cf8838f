//! Line sources for the interpreter loop.

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};
use tracing::debug;

/// A source of command lines.
///
/// `Ok(None)` means end-of-input. Any `Err` is a genuine read failure; the
/// interpreter treats both as the end of the session and never retries.
pub trait LineReader {
    /// Show `prompt` and block until a whole line is available.
    ///
    /// The returned line has its terminator removed.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive reader with line editing, used when stdin is a terminal.
///
/// Lines are not added to the editor history.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialize line editor")?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => {
                debug!("end of input");
                Ok(None)
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C drops whatever was typed so far.
                debug!("line interrupted");
                Ok(Some(String::new()))
            }
            Err(err) => Err(err).context("failed to read line"),
        }
    }
}

/// Reader over any buffered byte stream.
///
/// The prompt is written to `prompt_out` before each read. Lines may be of any
/// length. Bytes that are not valid UTF-8 are replaced rather than rejected.
pub struct PlainReader<R, W> {
    input: R,
    prompt_out: W,
    buf: Vec<u8>,
}

impl<R: BufRead, W: Write> PlainReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self {
            input,
            prompt_out,
            buf: Vec::new(),
        }
    }

    /// Consume the reader and return the prompt sink.
    pub fn into_prompt_out(self) -> W {
        self.prompt_out
    }
}

impl<R: BufRead, W: Write> LineReader for PlainReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompt_out
            .write_all(prompt.as_bytes())
            .and_then(|()| self.prompt_out.flush())
            .context("failed to write prompt")?;

        self.buf.clear();
        let read = self
            .input
            .read_until(b'\n', &mut self.buf)
            .context("failed to read line")?;
        if read == 0 {
            debug!("end of input");
            return Ok(None);
        }

        if self.buf.ends_with(b"\n") {
            self.buf.pop();
            if self.buf.ends_with(b"\r") {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
