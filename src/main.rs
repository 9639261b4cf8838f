use argh::FromArgs;
use std::io::{self, IsTerminal};
use tinysh::{EditorReader, Interpreter, LineReader, PlainReader};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A tiny interactive command interpreter.
struct Args {
    #[argh(option, default = "String::from(\"$ \")")]
    /// prompt printed before each line
    prompt: String,

    #[argh(switch)]
    /// read standard input without line editing, even on a terminal
    plain: bool,
}

fn main() {
    // Logging is silent unless RUST_LOG asks for it (e.g. RUST_LOG=tinysh=debug).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args: Args = argh::from_env();

    let mut reader: Box<dyn LineReader> = if args.plain || !io::stdin().is_terminal() {
        Box::new(PlainReader::new(io::stdin().lock(), io::stdout()))
    } else {
        match EditorReader::new() {
            Ok(editor) => Box::new(editor),
            Err(err) => {
                tracing::debug!("falling back to plain input: {:#}", err);
                Box::new(PlainReader::new(io::stdin().lock(), io::stdout()))
            }
        }
    };

    let code = Interpreter::new().repl(reader.as_mut(), &args.prompt);
    std::process::exit(code);
}
