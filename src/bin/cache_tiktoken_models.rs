use anyhow::{Context, Result};
use clap::Parser;
use prewarm::cache::ensure_dir;
use prewarm::config::Settings;
use prewarm::provision::{ConsoleReporter, Provisioner, ResourceSpec};
use prewarm::runner;
use prewarm::tiktoken::{self, BlobCache, TiktokenLoader};
use std::process::ExitCode;

const USAGE_HINT: &str =
    "Please specify a model name, e.g.: cache-tiktoken-models --model gpt-3.5-turbo";

#[derive(Parser)]
#[command(name = "cache-tiktoken-models")]
#[command(about = "Pre-warm the tiktoken encoding cache", long_about = None)]
struct Cli {
    /// Cache a single model instead of the built-in list
    #[arg(long, value_name = "NAME", num_args = 0..=1)]
    model: Option<Option<String>>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    runner::init_tracing();

    let cli = Cli::parse();

    let single = match cli.model {
        Some(Some(name)) if !name.trim().is_empty() => Some(name.trim().to_string()),
        Some(_) => {
            println!("{USAGE_HINT}");
            return Ok(ExitCode::SUCCESS);
        }
        None => None,
    };

    let settings = Settings::load().context("Failed to load settings")?;
    let network = runner::network_config(&settings);
    runner::announce_proxy(&network);

    let cache_dir = &settings.tiktoken.cache_dir;
    ensure_dir(cache_dir)?;
    println!("Cache directory: {}", cache_dir.display());

    let client = network
        .build_client()
        .context("Failed to set up HTTP client")?;
    let loader = TiktokenLoader::new(BlobCache::new(cache_dir, client));
    let provisioner = Provisioner::new(
        loader,
        ConsoleReporter::new("tiktoken models and encodings", "tokens"),
    );

    let code = match single {
        Some(name) => {
            let result = provisioner.run_single(&ResourceSpec::model(name)).await;
            runner::single_exit_code(result, &settings)
        }
        None => {
            let report = provisioner.run(tiktoken::RESOURCES).await;
            runner::exit_code(&report, &settings)
        }
    };

    Ok(code)
}
