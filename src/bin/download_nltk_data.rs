use anyhow::{Context, Result};
use clap::Parser;
use prewarm::cache::ensure_dir;
use prewarm::config::Settings;
use prewarm::nltk::{self, NltkLoader, PackageDownloader};
use prewarm::provision::{ConsoleReporter, Provisioner};
use prewarm::runner;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "download-nltk-data")]
#[command(about = "Download the NLTK data packages used at runtime", long_about = None)]
struct Cli {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    runner::init_tracing();

    let _cli = Cli::parse();

    let settings = Settings::load().context("Failed to load settings")?;
    let network = runner::network_config(&settings);
    runner::announce_proxy(&network);

    let data_dir = settings.nltk_data_dir()?;
    ensure_dir(&data_dir)?;
    println!("NLTK data directory: {}", data_dir.display());

    let client = network
        .build_client()
        .context("Failed to set up HTTP client")?;
    let downloader = PackageDownloader::new(client, data_dir, settings.nltk.base_url.clone());
    let provisioner = Provisioner::new(
        NltkLoader::new(downloader),
        ConsoleReporter::new("NLTK data packages", "files"),
    );

    let report = provisioner.run(nltk::RESOURCES).await;
    Ok(runner::exit_code(&report, &settings))
}
