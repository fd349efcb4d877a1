use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use pricewatch::browser::BrowserSession;
use pricewatch::config::AppConfig;
use pricewatch::models::{Catalog, ResultSet};
use pricewatch::orchestrator::ExtractionOrchestrator;

#[derive(Parser, Debug)]
#[command(name = "pricewatch", version, about = "Competitor price monitoring through an automated browser")]
struct Cli {
    /// Path to the product catalog (TOML, [[products]] entries)
    #[arg(long, default_value = "catalog.toml")]
    catalog: PathBuf,

    /// Alert threshold as a percentage gap; defaults to the configured value
    #[arg(long, value_parser = clap::value_parser!(u8).range(5..=50))]
    threshold: Option<u8>,

    /// Only check products whose name contains this brand (repeatable)
    #[arg(long = "brand")]
    brands: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pricewatch=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let threshold = cli
        .threshold
        .unwrap_or(config.run.default_threshold_percent);

    let catalog = Catalog::from_toml(&std::fs::read_to_string(&cli.catalog)?)?;
    let catalog = catalog.filter_by_brands(&cli.brands);
    if catalog.is_empty() {
        warn!("catalog is empty after brand filtering, nothing to do");
        return Ok(());
    }

    info!(
        products = catalog.len(),
        threshold, "starting pricewatch run"
    );

    // A browser that cannot start is fatal: no site can be checked.
    let session = BrowserSession::acquire(&config.browser)?;

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            println!("{event}");
        }
    });

    let orchestrator = ExtractionOrchestrator::new(session, config).with_progress(progress_tx);

    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let results = orchestrator.run(&catalog, threshold).await;
    drop(orchestrator);
    printer.await?;

    match cli.format {
        OutputFormat::Table => print_table(&results),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
    }

    Ok(())
}

fn print_table(results: &ResultSet) {
    println!();
    for row in results.rows() {
        let cells: Vec<String> = row
            .sites
            .iter()
            .map(|cell| {
                format!(
                    "{}: {} ({})",
                    cell.quote.site_id,
                    cell.quote.price_label(),
                    cell.gap_label()
                )
            })
            .collect();

        println!(
            "{:<40} {:>8}  {}  [{}]",
            row.product.name,
            row.product.own_price,
            cells.join("  "),
            row.alert.label()
        );
    }

    println!(
        "\n{} products checked, {} alerts",
        results.len(),
        results.alerts().count()
    );
}
