use clap::Parser;
use kilt_editor::{Editor, StdinRawMode, TextBuffer};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::exit;

/// A small terminal text editor with syntax highlighting
#[derive(Parser, Debug)]
#[command(name = "kilt", version, about)]
struct Args {
    /// File to edit. It is created on save when it does not exist
    file: Option<PathBuf>,

    /// Write logs to the file. Log level is filtered by $KILT_LOG (default: info)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn init_logger(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    // Logs must not go to the terminal since it is the editor screen
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("KILT_LOG", "info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn edit(file: Option<PathBuf>) -> kilt_editor::Result<()> {
    // Load file before entering raw mode so that an error is shown on normal terminal
    let buf = match file {
        Some(path) => TextBuffer::open(path)?,
        None => TextBuffer::empty(),
    };

    let input = StdinRawMode::new()?.input_keys();
    Editor::with_buffer(buf, input, io::stdout(), None)?.edit()
    // Raw mode is restored on drop of input
}

fn main() {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        if let Err(err) = init_logger(path) {
            eprintln!("Could not open log file {:?}: {}", path, err);
            exit(1);
        }
    }

    if let Err(err) = edit(args.file) {
        log::error!("{}", err);
        eprintln!("Error: {}", err);
        exit(1);
    }
}
