//! treez CLI
//!
//! Prints the element structure of HTML pages as an indented outline.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use treez_common::FetchConfig;
use treez_common::SourceLoader;
use treez_common::net::DEFAULT_USER_AGENT;
use treez_html::{DEFAULT_MAX_DEPTH, ParserOptions};
use treez_outline::{OutlineError, OutlineOptions, OutlineReport, Pipeline};

/// treez - outline the element tree of HTML pages
#[derive(Parser, Debug)]
#[command(name = "treez")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Outline a page
    treez https://example.com

    # Several sources; a failing one does not stop the rest
    treez ./index.html https://example.com/missing https://example.org

    # Inline markup, with attributes
    treez --attrs --html '<ul><li class=a>one</ul>'

    # Node counts per source on stderr
    treez --stats ./index.html
"#)]
struct Cli {
    /// URLs, data: URLs or file paths to outline
    #[arg(value_name = "SOURCE", required_unless_present = "html")]
    sources: Vec<String>,

    /// Outline an HTML string instead of (or before) the sources
    #[arg(long, value_name = "MARKUP")]
    html: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "TREEZ_TIMEOUT", value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// User-Agent header for HTTP requests
    #[arg(
        long,
        env = "TREEZ_USER_AGENT",
        value_name = "UA",
        default_value = DEFAULT_USER_AGENT,
        hide_default_value = true
    )]
    user_agent: String,

    /// Spaces per nesting level
    #[arg(long, env = "TREEZ_INDENT", value_name = "N", default_value_t = 4)]
    indent: usize,

    /// Show attributes in opening tags
    #[arg(long)]
    attrs: bool,

    /// Deepest element nesting the parser accepts
    #[arg(long, env = "TREEZ_MAX_DEPTH", value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Replace invalid UTF-8 with U+FFFD instead of rejecting the source
    #[arg(long)]
    lossy: bool,

    /// Print node counts for each source to stderr
    #[arg(long)]
    stats: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let fetch_config = FetchConfig {
        timeout: Duration::from_secs(cli.timeout),
        user_agent: cli.user_agent.clone(),
    };
    let loader = SourceLoader::new(&fetch_config).context("failed to set up the HTTP client")?;

    let pipeline = Pipeline::new(loader)
        .with_parser_options(ParserOptions {
            max_depth: cli.max_depth,
            lossy_utf8: cli.lossy,
        })
        .with_outline_options(OutlineOptions {
            indent_width: cli.indent,
            show_attributes: cli.attrs,
        });

    let mut sink = io::stdout().lock();

    if let Some(markup) = &cli.html {
        let result = pipeline.outline_markup(markup, &mut sink);
        report("--html", &result, cli.stats);
    }

    let summary = pipeline.run_batch(&cli.sources, &mut sink, |source, result| {
        report(source, result, cli.stats);
    });
    debug!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "all sources done"
    );

    Ok(())
}

/// Print the outcome of one source to stderr.
fn report(source: &str, result: &Result<OutlineReport, OutlineError>, show_stats: bool) {
    match result {
        Ok(outline) if show_stats => {
            eprintln!(
                "{}: {}, {} parse issues",
                source.bold(),
                outline.stats,
                outline.issues
            );
        }
        Ok(_) => {}
        Err(error) => eprintln!("{} {source}: {error}", "error:".red().bold()),
    }
}
