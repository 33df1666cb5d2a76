use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use medium_parser::{HttpFetcher, MediumData, MediumParser, Settings};

#[derive(Parser)]
#[command(name = "medium_parser", about = "Convert a Medium article to markdown")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an article by URL
    Url {
        url: String,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Parse a saved article page
    Html {
        file: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the parsed record as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load();
    let parser = MediumParser::new(HttpFetcher::new(&settings)?, settings);

    let (data, out) = match cli.command {
        Commands::Url { url, out } => {
            let data = parser
                .parse_from_url(&url)
                .await
                .with_context(|| format!("Failed to parse {}", url))?;
            (data, out)
        }
        Commands::Html { file, out } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let data = parser
                .parse_from_html(&html)
                .await
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            (data, out)
        }
    };

    let text = if out.json {
        serde_json::to_string_pretty(&data)?
    } else {
        to_document(&data)
    };

    match &out.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote \"{}\" to {}", data.title, path.display());
        }
        None => println!("{}", text),
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("Done in {:.1}s", elapsed.as_secs_f64());
    }

    Ok(())
}

/// Title, byline and poster ahead of the body.
fn to_document(data: &MediumData) -> String {
    let mut doc = format!("# {}\n\n", data.title);
    if !data.headline.is_empty() {
        doc.push_str(&format!("*{}*\n\n", data.headline));
    }
    if !data.author.is_empty() {
        doc.push_str(&format!(
            "By {} on {}\n\n",
            data.author,
            data.published_time.format("%Y-%m-%d")
        ));
    }
    if !data.poster.is_empty() {
        doc.push_str(&format!("![]({})\n\n", data.poster));
    }
    doc.push_str(&data.markdown);
    doc.push('\n');
    doc
}
