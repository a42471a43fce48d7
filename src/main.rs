use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use product_rank_fetcher::export::{
    ExportLayout, export_timestamp, write_product_csv, write_product_json, write_rank_csv,
    write_rank_json,
};
use product_rank_fetcher::{
    AmazonScraper, AppConfig, FlipkartScraper, Marketplace, MarketplaceConfig, RankFetcher,
    load_app_config,
};

#[derive(Debug, Parser)]
#[command(name = "product-rank-fetcher")]
#[command(about = "Keyword search ranks and product details from Amazon.in and Flipkart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rank the top search results for each keyword
    Search {
        #[command(flatten)]
        common: CommonArgs,

        /// Number of ranked results per keyword
        #[arg(short = 'n', long)]
        count: Option<usize>,

        keywords: Vec<String>,
    },
    /// Fetch product details by ASIN or product URL
    Product {
        #[command(flatten)]
        common: CommonArgs,

        identifiers: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct CommonArgs {
    #[arg(short, long, value_enum, default_value_t = MarketplaceArg::Amazon)]
    marketplace: MarketplaceArg,

    /// Read inputs from a file, one per line
    #[arg(short = 'i', long)]
    input_file: Option<PathBuf>,

    /// Write results here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MarketplaceArg {
    Amazon,
    Flipkart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_app_config().context("Failed to load configuration")?;

    match cli.command {
        Commands::Search {
            common,
            count,
            keywords,
        } => {
            let count = count.unwrap_or(config.default_count);
            if !(1..=config.max_count).contains(&count) {
                bail!("--count must be between 1 and {}", config.max_count);
            }
            let keywords = collect_inputs(keywords, common.input_file.as_deref())?;
            let fetcher = build_fetcher(common.marketplace, &config)?;
            let name = fetcher.marketplace().name().to_string();

            info!("Starting {} rank fetch for {} keywords", name, keywords.len());
            let results = fetcher.search_keywords(&keywords, count).await;

            let timestamp = export_timestamp();
            let out = open_output(common.output.as_deref())?;
            let rows = match common.format {
                OutputFormat::Csv => {
                    write_rank_csv(out, ExportLayout::for_marketplace(&name), &results, &timestamp)?
                }
                OutputFormat::Json => write_rank_json(out, &name, &results, &timestamp)?,
            };
            info!("Exported {} rows", rows);
        }
        Commands::Product {
            common,
            identifiers,
        } => {
            let identifiers = collect_inputs(identifiers, common.input_file.as_deref())?;
            let fetcher = build_fetcher(common.marketplace, &config)?;
            let name = fetcher.marketplace().name().to_string();

            info!("Starting {} product fetch for {} inputs", name, identifiers.len());
            let products = fetcher.fetch_products(&identifiers).await;
            if products.is_empty() {
                info!("No valid product information found");
            }

            let timestamp = export_timestamp();
            let out = open_output(common.output.as_deref())?;
            let rows = match common.format {
                OutputFormat::Csv => write_product_csv(
                    out,
                    ExportLayout::for_marketplace(&name),
                    &products,
                    &timestamp,
                )?,
                OutputFormat::Json => write_product_json(out, &name, &products, &timestamp)?,
            };
            info!("Exported {} rows", rows);
        }
    }

    Ok(())
}

fn build_fetcher(marketplace: MarketplaceArg, config: &AppConfig) -> Result<RankFetcher> {
    let base = match marketplace {
        MarketplaceArg::Amazon => MarketplaceConfig::amazon(),
        MarketplaceArg::Flipkart => MarketplaceConfig::flipkart(),
    };
    let delay = base.page_delay.scaled(config.delay_scale);
    let site = base.with_page_delay(delay);

    let marketplace: Arc<dyn Marketplace> = match marketplace {
        MarketplaceArg::Amazon => Arc::new(AmazonScraper::with_config(site)?),
        MarketplaceArg::Flipkart => Arc::new(FlipkartScraper::with_config(site)?),
    };
    Ok(RankFetcher::new(marketplace, config.request_timeout())?)
}

/// Positional inputs followed by the non-blank lines of `input_file`.
fn collect_inputs(mut inputs: Vec<String>, input_file: Option<&Path>) -> Result<Vec<String>> {
    if let Some(path) = input_file {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file: {}", path.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            let line = line.trim();
            if !line.is_empty() {
                inputs.push(line.to_string());
            }
        }
    }

    inputs.retain(|input| !input.trim().is_empty());
    if inputs.is_empty() {
        bail!("No inputs given; pass them as arguments or with --input-file");
    }
    Ok(inputs)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(io::stdout()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn input_file_lines_follow_positional_inputs() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "usb hub\n\n   \n  wireless mouse  ").unwrap();

        let inputs = collect_inputs(vec!["keyboard".to_string()], Some(file.path())).unwrap();
        assert_eq!(inputs, vec!["keyboard", "usb hub", "wireless mouse"]);
    }

    #[test]
    fn no_inputs_is_an_error() {
        assert!(collect_inputs(vec!["  ".to_string()], None).is_err());
        assert!(collect_inputs(Vec::new(), Some(Path::new("/nonexistent/inputs.txt"))).is_err());
    }

    #[test]
    fn output_file_receives_export() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("ranks.csv");
        {
            let mut out = open_output(Some(&path)).unwrap();
            out.write_all(b"Keyword,Rank\n").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Keyword,Rank\n");
    }

    #[test]
    fn cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "product-rank-fetcher",
            "search",
            "--marketplace",
            "flipkart",
            "-n",
            "20",
            "--format",
            "json",
            "earbuds",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                common,
                count,
                keywords,
            } => {
                assert_eq!(common.marketplace, MarketplaceArg::Flipkart);
                assert_eq!(common.format, OutputFormat::Json);
                assert_eq!(count, Some(20));
                assert_eq!(keywords, vec!["earbuds"]);
            }
            Commands::Product { .. } => panic!("expected search"),
        }
    }
}
