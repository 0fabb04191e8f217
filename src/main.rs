use citegen::{CitationGenerator, Config, OutputFormat};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "citegen")]
#[command(version = "0.1.0")]
#[command(about = "Generate citations from DOIs and ISBNs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate citations for one or more identifiers
    Cite {
        /// DOIs or ISBNs to cite
        #[arg(required = true)]
        identifiers: Vec<String>,

        /// Citation style (see `citegen styles`)
        #[arg(long, short, default_value = "apa")]
        style: String,

        /// Emit HTML instead of plain text
        #[arg(long)]
        html: bool,

        /// Also print the canonical CSL-JSON record
        #[arg(long)]
        record: bool,

        /// Disable the response cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Check whether identifiers parse as a DOI or ISBN
    Validate {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// List available citation styles
    Styles,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("citegen=debug")
            .init();
    }

    match args.command {
        Command::Cite {
            identifiers,
            style,
            html,
            record,
            no_cache,
        } => cite(identifiers, style, html, record, no_cache).await,
        Command::Validate { identifiers } => validate(&identifiers),
        Command::Styles => {
            for s in citegen::styles::STYLES {
                println!("{:14} {}", s.name.bold(), s.description);
            }
            ExitCode::SUCCESS
        }
    }
}

async fn cite(
    identifiers: Vec<String>,
    style: String,
    html: bool,
    print_record: bool,
    no_cache: bool,
) -> ExitCode {
    const CONCURRENCY_LIMIT: usize = 4;

    let mut config = Config::from_env();
    if no_cache {
        config.cache_enabled = false;
    }
    let generator = CitationGenerator::new(&config);

    let format = if html {
        OutputFormat::Html
    } else {
        OutputFormat::Plain
    };

    let pb = ProgressBar::new(identifiers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let results: Vec<_> = stream::iter(identifiers)
        .map(|id| {
            let generator = &generator;
            let style = &style;
            async move {
                let result = generator.generate(&id, style, format).await;
                (id, result)
            }
        })
        .buffered(CONCURRENCY_LIMIT)
        .inspect(|_| pb.inc(1))
        .collect()
        .await;

    pb.finish_and_clear();

    let mut failures = 0;
    for (id, result) in results {
        match result {
            Ok(citation) => {
                println!("{} ({})", id.cyan().bold(), citation.kind);
                println!("  {}", citation.full_citation);
                println!("  {} {}", "parenthetical:".dimmed(), citation.parenthetical);
                println!("  {} {}", "narrative:".dimmed(), citation.narrative);
                if print_record {
                    match serde_json::to_string_pretty(&citation.record) {
                        Ok(json) => println!("{}", json),
                        Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
                    }
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{} {}: {}", "Error:".red().bold(), id, e);
            }
        }
        println!();
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn validate(identifiers: &[String]) -> ExitCode {
    let mut failures = 0;
    for id in identifiers {
        match citegen::classify(id) {
            Ok(parsed) => println!(
                "{} {} ({}, normalized: {})",
                "valid".green().bold(),
                id,
                parsed.kind,
                parsed.normalized
            ),
            Err(e) => {
                failures += 1;
                println!("{} {}: {}", "invalid".red().bold(), id, e);
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
