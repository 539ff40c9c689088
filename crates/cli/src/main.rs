use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sift_core::{ExtractionResult, ExtractionSource};
use sift_observability::init_tracing;
use sift_strategy::{DelegateConfig, SiftStack};

#[derive(Debug, Parser)]
#[command(name = "sift")]
#[command(about = "Extract zip, brand, category and time preference from free text")]
struct Cli {
    /// Skip the language-model delegate even when it is configured.
    #[arg(long, global = true, env = "SIFT_RULES_ONLY")]
    rules_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a single text.
    Extract {
        text: String,
        /// Show which rule produced each field (rule engine only).
        #[arg(long)]
        explain: bool,
    },
    /// Read texts from stdin, one per line.
    Interactive,
    /// Classify every non-empty line of a file and print JSON lines.
    Batch { file: PathBuf },
}

#[derive(Debug, Serialize)]
struct BatchRecord<'a> {
    line: usize,
    text: &'a str,
    source: ExtractionSource,
    result: ExtractionResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("sift_cli");
    let cli = Cli::parse();

    let stack = build_stack(cli.rules_only)?;

    match cli.command {
        Command::Extract { text, explain } => {
            if explain {
                let explanation = stack.rules.explain(&text);
                println!("{}", serde_json::to_string_pretty(&explanation)?);
            } else {
                let extraction = stack.strategy.extract(&text).await;
                println!("{}", serde_json::to_string_pretty(&extraction.result)?);
            }
        }
        Command::Interactive => run_interactive(&stack).await?,
        Command::Batch { file } => run_batch(&stack, &file).await?,
    }

    Ok(())
}

fn build_stack(rules_only: bool) -> Result<SiftStack> {
    let config = if rules_only {
        DelegateConfig::rules_only()
    } else {
        let _ = dotenvy::dotenv();
        DelegateConfig::from_env()
    };
    SiftStack::load(&config)
}

async fn run_interactive(stack: &SiftStack) -> Result<()> {
    println!("sift interactive mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        if text.is_empty() {
            continue;
        }

        let extraction = stack.strategy.extract(text).await;
        println!("{}", serde_json::to_string(&extraction.result)?);
    }

    Ok(())
}

async fn run_batch(stack: &SiftStack, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed reading batch file {}", file.display()))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (idx, line) in raw.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let extraction = stack.strategy.extract(text).await;
        let record = BatchRecord {
            line: idx + 1,
            text,
            source: extraction.source,
            result: extraction.result,
        };
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
    }

    out.flush()?;
    Ok(())
}
