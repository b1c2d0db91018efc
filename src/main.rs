use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use tabdb::{Catalog, Interpreter};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs commands against a directory of tab-separated databases.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding one sub-directory per database.
    #[arg(long, env = "TABDB_DATA_DIR", default_value = "databases")]
    data_dir: PathBuf,

    /// Run a single command, print its response and exit.
    #[arg(short, long)]
    command: Option<String>,
}

fn main() -> tabdb::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    std::fs::create_dir_all(&args.data_dir)?;
    info!("Using data directory {:?}", args.data_dir);
    let mut interpreter = Interpreter::new(Catalog::new(&args.data_dir));

    match args.command {
        Some(command) => println!("{}", interpreter.handle(&command)),
        None => repl(&mut interpreter)?,
    }

    interpreter.shutdown()
}

/// Reads commands from stdin until `.exit`, `.quit` or end of input.
/// A command may span several lines and ends at a line ending with `;`.
fn repl(interpreter: &mut Interpreter) -> io::Result<()> {
    println!("tabdb (type '.exit' or '.quit' to stop)");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut buffer = String::new();

    loop {
        if buffer.is_empty() {
            print!("tabdb> ");
        } else {
            print!("...    ");
        }
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();

        if buffer.is_empty() && (trimmed == ".exit" || trimmed == ".quit") {
            break;
        }
        if trimmed.is_empty() && buffer.is_empty() {
            continue;
        }

        buffer.push_str(&line);
        if trimmed.ends_with(';') {
            let command = std::mem::take(&mut buffer);
            println!("{}", interpreter.handle(&command));
        } else {
            buffer.push('\n');
        }
    }

    Ok(())
}
