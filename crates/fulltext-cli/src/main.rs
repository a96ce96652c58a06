//! FullText CLI - Command-line interface for full-text retrieval

mod mcp;

use clap::{Parser, Subcommand, ValueEnum};
use fulltext::{Outcome, RetrievalService, TOOL_LLMTXT};
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Output format for get subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Plain text with YAML frontmatter
    #[default]
    Md,
    /// JSON body as served to callers
    Json,
}

/// FullText - extract the main readable text of web pages
#[derive(Parser, Debug)]
#[command(name = "fulltext")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,
}

/// Retrieval options shared by all subcommands
#[derive(clap::Args, Debug, Clone, Default)]
struct ServiceArgs {
    /// Fetch timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Maximum number of redirects to follow
    #[arg(long)]
    max_redirects: Option<usize>,

    /// Maximum response body size in bytes
    #[arg(long)]
    max_bytes: Option<usize>,

    /// Minimum text density of extracted content
    #[arg(long)]
    min_density: Option<f64>,

    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,
}

impl ServiceArgs {
    fn build(self) -> RetrievalService {
        let mut builder = RetrievalService::builder();
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(max) = self.max_redirects {
            builder = builder.max_redirects(max);
        }
        if let Some(max) = self.max_bytes {
            builder = builder.max_body_bytes(max);
        }
        if let Some(density) = self.min_density {
            builder = builder.min_text_density(density);
        }
        if let Some(ua) = self.user_agent {
            builder = builder.user_agent(ua);
        }

        builder.build().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp {
        #[command(flatten)]
        service: ServiceArgs,
    },
    /// Retrieve a URL and print its main text
    Get {
        /// URL to retrieve
        url: String,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,

        #[command(flatten)]
        service: ServiceArgs,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Handle --llmtxt flag
    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    match cli.command {
        Some(Commands::Mcp { service }) => {
            mcp::run_server(service.build()).await;
        }
        Some(Commands::Get {
            url,
            output,
            service,
        }) => {
            run_get(&service.build(), &url, output).await;
        }
        None => {
            eprintln!("Usage: fulltext get <URL>");
            eprintln!("   or: fulltext mcp");
            eprintln!("   or: fulltext --help");
            std::process::exit(1);
        }
    }
}

async fn run_get(service: &RetrievalService, url: &str, output: OutputFormat) {
    let outcome = service.get_full_text(url).await;

    match output {
        OutputFormat::Md => match &outcome {
            Outcome::Success(_) => writeln_safe(&format_md_with_frontmatter(url, &outcome)),
            Outcome::Failure(failure) => {
                eprintln!("Error: {}: {}", failure.kind, failure.detail);
            }
        },
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome.to_response()).unwrap_or_else(|e| {
                eprintln!("Error serializing response: {}", e);
                std::process::exit(1);
            });
            writeln_safe(&json);
        }
    }

    if !outcome.is_success() {
        std::process::exit(1);
    }
}

/// Format a successful outcome as text blocks with YAML frontmatter
fn format_md_with_frontmatter(url: &str, outcome: &Outcome) -> String {
    let mut output = String::new();

    output.push_str("---\n");
    output.push_str(&format!("url: {}\n", url));
    output.push_str(&format!("status_code: {}\n", outcome.http_status()));
    if let Outcome::Success(result) = outcome {
        if let Some(ref title) = result.title {
            output.push_str(&format!("title: {}\n", title));
        }
        output.push_str(&format!("confidence: {:.2}\n", result.confidence));
        output.push_str("---\n");
        output.push_str(&result.blocks.join("\n\n"));
    } else {
        output.push_str("---\n");
    }

    output
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
