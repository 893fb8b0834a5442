//! CLI tool to run a lazy element pipeline over the lines of a file.
//!
//! Usage:
//!   stream-run <input.txt> [--locate TEXT]... [--upper] [--count]
//!   stream-run <input.txt> --skip 2 --take 5 --join ", " -o <output.txt>
//!
//! Stages run in a fixed order: locate, nlocate, skip/take, case, reverse,
//! delay. If no output file is specified, writes to stdout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use lazy_pipe::{CollectTrace, Collectors, Fate, StreamError, read_lines, stream};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stream-run", about = "Run a lazy element pipeline over the lines of a file")]
struct Args {
    /// Input file, one element per line (empty lines are skipped)
    input: PathBuf,

    /// Keep lines containing TEXT (repeatable)
    #[arg(long, value_name = "TEXT")]
    locate: Vec<String>,

    /// Drop lines containing TEXT (repeatable)
    #[arg(long, value_name = "TEXT")]
    nlocate: Vec<String>,

    /// Drop lines before this source position
    #[arg(long, value_name = "N")]
    skip: Option<usize>,

    /// Keep at most N source positions after the skipped ones
    #[arg(long, value_name = "N")]
    take: Option<usize>,

    /// Convert lines to uppercase
    #[arg(long, conflicts_with = "lower")]
    upper: bool,

    /// Convert lines to lowercase
    #[arg(long)]
    lower: bool,

    /// Reverse the characters of each line
    #[arg(long)]
    reverse: bool,

    /// Wait this long on every surviving line before passing it on
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Print the number of surviving lines instead of the lines
    #[arg(long, conflicts_with_all = ["join", "trace"])]
    count: bool,

    /// Join surviving lines into one line using SEP
    #[arg(long, value_name = "SEP", conflicts_with = "trace")]
    join: Option<String>,

    /// Report each line's fate on stderr
    #[arg(long)]
    trace: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let output_file = args.output.clone();

    let (output, input_count) = match run(args).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Pipeline error: {}", e);
            process::exit(1);
        }
    };

    if let Some(out_path) = output_file {
        if let Err(e) = write_output(&out_path, &output) {
            eprintln!("Error writing output file '{}': {}", out_path.display(), e);
            process::exit(1);
        }
        eprintln!("Processed {} lines, output: {}", input_count, out_path.display());
    } else {
        if let Err(e) = io::stdout().write_all(output.as_bytes()) {
            eprintln!("Error writing output: {}", e);
            process::exit(1);
        }
        if !output.is_empty() && !output.ends_with('\n') {
            println!();
        }
        eprintln!("Processed {} lines", input_count);
    }
}

/// Build the pipeline from `args`, collect it, and render the result.
///
/// Returns (output_text, input_count).
async fn run(args: Args) -> Result<(String, usize), StreamError> {
    let lines = read_lines(&args.input)?;
    let input_count = lines.len();

    let mut staged = stream(lines)?.staged();
    for pattern in args.locate {
        staged = staged.filter(move |line, _| line.contains(&pattern));
    }
    for pattern in args.nlocate {
        staged = staged.filter(move |line, _| !line.contains(&pattern));
    }
    let skip = args.skip.unwrap_or(0);
    if skip > 0 {
        staged = staged.filter(move |_, index| index >= skip);
    }
    if let Some(take) = args.take {
        let end = window_end(skip, take);
        staged = staged.filter(move |_, index| index < end);
    }
    if args.upper {
        staged = staged.map(|line| line.to_uppercase());
    } else if args.lower {
        staged = staged.map(|line| line.to_lowercase());
    }
    if args.reverse {
        staged = staged.map(|line| line.chars().rev().collect());
    }
    if let Some(ms) = args.delay_ms {
        staged = staged.then(move |line| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            line
        });
    }

    let output = if args.count {
        let count = staged
            .collect(Collectors::reducing_from(0usize, |n, _: String, _| n + 1))
            .await?;
        count.unwrap_or(0).to_string()
    } else if let Some(sep) = args.join {
        let joined = staged
            .collect(Collectors::reducing(move |acc: String, cur: String, _| {
                format!("{acc}{sep}{cur}")
            }))
            .await?;
        joined.unwrap_or_default()
    } else if args.trace {
        let (lines, trace) = staged.collect(Collectors::traced()).await?;
        report_trace(&trace);
        lines.join("\n")
    } else {
        staged.collect(Collectors::to_vec()).await?.join("\n")
    };

    Ok((output, input_count))
}

/// First line index past the `--skip`/`--take` window.
fn window_end(skip: usize, take: usize) -> usize {
    skip.saturating_add(take)
}

fn report_trace(trace: &CollectTrace) {
    eprintln!("Stages: {}", trace.stage_names.join(" | "));
    for element in &trace.elements {
        match &element.fate {
            Fate::Kept => eprintln!("  line {}: kept", element.index),
            Fate::Dropped { stage } => eprintln!(
                "  line {}: dropped by {} (stage {})",
                element.index, trace.stage_names[*stage], stage
            ),
            Fate::Failed { stage, message } => {
                eprintln!("  line {}: failed in stage {}: {}", element.index, stage, message)
            }
        }
    }
}

fn write_output(out_path: &Path, output: &str) -> io::Result<()> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(out_path, output)
}
