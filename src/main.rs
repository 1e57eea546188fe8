use clap::{Parser, Subcommand};
use dr_schools_fetcher::config::FetcherConfig;
use dr_schools_fetcher::export::OutputFormat;
use dr_schools_fetcher::logging::init_logging;
use dr_schools_fetcher::model::SourceKind;
use dr_schools_fetcher::pipeline::{run_pipeline, PipelineOptions, PipelineReport};
use dr_schools_fetcher::sources::{CkanClient, PrimarySource};
use std::fs;
use tracing::error;

#[derive(Parser)]
#[command(name = "dr-schools-fetcher")]
#[command(about = "Dominican Republic school data fetcher - government first, OpenStreetMap fallback")]
#[command(version = "2.0.0")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch school data and export it to a file
    Fetch {
        /// Output format (csv or json)
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        /// Limit number of records (0 for all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Check the current availability of both data sources
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    init_logging();

    let mut config = FetcherConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Fetch {
            format,
            limit,
            output_dir,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            fetch(&config, format, limit).await
        }
        Commands::Status => status(&config).await,
    }
}

async fn fetch(config: &FetcherConfig, format: OutputFormat, limit: usize) -> anyhow::Result<()> {
    println!("🇩🇴 Dominican Republic School Data Fetcher - Starting...");
    println!("🔄 Data Source Strategy: Government First, OpenStreetMap Fallback");
    println!();
    println!("🏛️  Primary Source: {}", config.primary.base_url);
    println!("🗺️  Secondary Source: {}", config.secondary.url);
    println!();

    let options = PipelineOptions { format, limit };
    match run_pipeline(config, &options).await {
        Ok(report) => {
            show_results(&report, format);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline run failed: {}", e);
            println!("❌ Error: {}", e);
            println!("📝 Note: the government data source is known to be intermittently");
            println!("   unavailable; falling back to OpenStreetMap is expected.");
            Err(e.into())
        }
    }
}

fn show_results(report: &PipelineReport, format: OutputFormat) {
    let source_status = match report.source_used {
        SourceKind::Government => "✅ Government (Primary)".to_string(),
        SourceKind::OpenStreetMap => {
            "⚠️  OpenStreetMap (Fallback - Government Unavailable)".to_string()
        }
    };
    let file_size = fs::metadata(&report.output_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());

    println!();
    println!("🎉 Dominican Republic Schools Data Successfully Retrieved!");
    println!();
    println!("   Data Source Used ......... {}", source_status);
    println!("   Primary Attempted ........ {}", report.primary_attempted);
    println!("   Total Schools Found ...... {}", report.total_count);
    println!("   Output Format ............ {}", format);
    println!("   File Location ............ {}", report.output_path.display());
    println!("   File Size ................ {}", file_size);
    println!(
        "   Completed At ............. {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
    println!("📁 File saved: {}", report.output_path.display());
}

async fn status(config: &FetcherConfig) -> anyhow::Result<()> {
    println!("🔍 Checking data source availability...");
    println!();

    let ckan = CkanClient::new(config.primary.clone());
    let government_status = match ckan.probe().await {
        Ok(true) => "API Accessible (No School Data Available)",
        Ok(false) => "Unavailable",
        Err(_) => "Unavailable",
    };

    println!("🏛️  Government CKAN API ..... {}", government_status);
    println!("🗺️  OpenStreetMap ........... Available");
    Ok(())
}

/// Human-readable byte count for the run summary.
fn format_bytes(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit = 0;
    while size > 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
