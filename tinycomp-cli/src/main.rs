use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{self, Command};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tinycomp_core::compile_to_string;

/// Compile a tinycomp program to JavaScript.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source file; read from stdin when omitted.
    #[arg(short, long)]
    input: Option<String>,

    /// Output file; written to stdout when omitted.
    #[arg(short, long)]
    output: Option<String>,

    #[arg(long, help = "Run the generated program with node (requires --output)")]
    run: bool,

    /// Arguments passed to the program when running it.
    #[arg(last = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(code) = execute(cli)? {
        process::exit(code);
    }
    Ok(())
}

/// Returns the exit status of the generated program when it was run.
fn execute(cli: Cli) -> Result<Option<i32>> {
    if cli.run && cli.output.is_none() {
        bail!("--run requires --output");
    }

    let (label, source) = match &cli.input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {path}"))?;
            (path.clone(), source)
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            ("<stdin>".to_string(), buffer)
        }
    };

    let js = compile_to_string(&label, &source)?;

    match &cli.output {
        Some(path) => write_output(path, js.as_bytes())?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(js.as_bytes()).context("failed to write stdout")?;
            stdout.flush()?;
        }
    }

    match (&cli.output, cli.run) {
        (Some(path), true) => run_node(path, &cli.args).map(Some),
        _ => Ok(None),
    }
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}

fn run_node(script: &str, args: &[String]) -> Result<i32> {
    let status = Command::new("node")
        .arg(script)
        .args(args)
        .status()
        .context("failed to start node")?;
    Ok(status.code().unwrap_or(1))
}
