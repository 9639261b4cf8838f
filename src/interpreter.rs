use crate::builtin::Builtin;
use crate::command::{EXIT_FAILURE, EXIT_SUCCESS, ExitCode, Outcome};
use crate::external;
use crate::lexer;
use crate::reader::LineReader;
use std::ffi::OsString;
use std::fmt::Display;
use std::io::{self, Stderr, Stdout, Write};
use tracing::{debug, trace};

/// Prefix for every diagnostic the interpreter writes.
const NAME: &str = "tinysh";

/// A minimal shell-like interpreter that runs built-in and external commands.
///
/// Built-in output goes to `stdout`, diagnostics to `stderr`. External programs
/// inherit the process's own standard streams.
///
/// Example
/// ```
/// use tinysh::{Interpreter, Outcome};
/// let mut sh = Interpreter::with_output(Vec::new(), Vec::new());
/// assert_eq!(sh.execute(&["help"]), Outcome::Continue);
/// assert_eq!(sh.execute(&["exit"]), Outcome::Terminate(0));
/// ```
pub struct Interpreter<O = Stdout, E = Stderr> {
    stdout: O,
    stderr: E,
    search_paths: Option<OsString>,
}

impl Interpreter {
    /// Create an interpreter writing to the process's stdout and stderr.
    pub fn new() -> Self {
        Self::with_output(io::stdout(), io::stderr())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, E: Write> Interpreter<O, E> {
    /// Create an interpreter with custom output streams.
    pub fn with_output(stdout: O, stderr: E) -> Self {
        Self {
            stdout,
            stderr,
            search_paths: None,
        }
    }

    /// Resolve external programs against `paths` instead of the `PATH` variable.
    pub fn with_search_paths(mut self, paths: impl Into<OsString>) -> Self {
        self.search_paths = Some(paths.into());
        self
    }

    /// Give back the output streams.
    pub fn into_output(self) -> (O, E) {
        (self.stdout, self.stderr)
    }

    /// Tokenize and execute one line.
    pub fn execute_line(&mut self, line: &str) -> Outcome {
        let tokens = lexer::split_into_tokens(line);
        self.execute(&tokens)
    }

    /// Execute one tokenized command and decide whether the loop goes on.
    ///
    /// An empty token sequence does nothing. A built-in name runs the built-in;
    /// anything else is launched as an external program, whose exit status
    /// never ends the loop. Failures are reported on `stderr` and swallowed.
    pub fn execute(&mut self, tokens: &[&str]) -> Outcome {
        let Some(&name) = tokens.first() else {
            return Outcome::Continue;
        };

        if let Some(builtin) = Builtin::lookup(name) {
            debug!(builtin = name, "running builtin");
            return match builtin.execute(tokens, &mut self.stdout) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.report(format_args!("{:#}", err));
                    Outcome::Continue
                }
            };
        }

        // Anything still buffered must reach the terminal before the child writes.
        let _ = self.stdout.flush();

        let search_paths = self.search_paths.clone().or_else(|| std::env::var_os("PATH"));
        match external::launch(tokens, search_paths.as_deref()) {
            Ok(termination) => trace!(program = name, ?termination, "external command finished"),
            Err(err) => self.report(err),
        }
        Outcome::Continue
    }

    /// Run the read-tokenize-dispatch loop until `exit`, end-of-input, or a
    /// read failure, and return the status the process should exit with.
    pub fn repl(&mut self, reader: &mut dyn LineReader, prompt: &str) -> ExitCode {
        loop {
            let line = match reader.read_line(prompt) {
                Ok(Some(line)) => line,
                Ok(None) => return EXIT_SUCCESS,
                Err(err) => {
                    self.report(format_args!("{:#}", err));
                    return EXIT_FAILURE;
                }
            };

            if let Outcome::Terminate(code) = self.execute_line(&line) {
                debug!(code, "terminating");
                return code;
            }
        }
    }

    fn report(&mut self, message: impl Display) {
        // Nothing sensible is left to do if stderr itself is broken.
        let _ = writeln!(self.stderr, "{}: {}", NAME, message);
    }
}
