// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use peerscope::catalog::{Catalog, SecurityRecord, load_catalog};
use peerscope::config::{self, Config};
use peerscope::export;
use peerscope::peers::{ClassificationField, PeerSet, select_peers};
use peerscope::pipeline::{PeerComparison, PeerPipeline, PipelineOptions};
use peerscope::prices::{CsvDirectory, PriceSource};
use peerscope::profile::CompanyProfile;
use peerscope::rebase::DateWindow;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.toml file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List securities available for selection
    List {
        /// Only show names containing this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
        /// Only show securities that have a price file
        #[arg(long)]
        with_prices: bool,
    },
    /// Show the peer set of a security (symbol or full name)
    Peers {
        security: String,
        /// Override the configured classification: industry or sector
        #[arg(long)]
        classification: Option<ClassificationField>,
    },
    /// Show catalog details of a security
    Profile { security: String },
    /// Compare rebased price performance against peers
    Compare {
        security: String,
        /// Window start (YYYY-MM-DD format)
        #[arg(long)]
        from: Option<String>,
        /// Window end (YYYY-MM-DD format)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        classification: Option<ClassificationField>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print daily OHLC rows of a security
    Candles {
        security: String,
        /// First date to include (YYYY-MM-DD format)
        #[arg(long, default_value = "2010-01-01")]
        since: String,
    },
    /// Export rebased, stock data and peer tables to CSV
    Export {
        security: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        classification: Option<ClassificationField>,
        /// Directory for the CSV files (defaults to output_dir from config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write the default configuration to the --config path
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD format", value))
}

/// Combine optional CLI bounds with the range the data actually covers.
fn resolve_window(
    from: Option<&str>,
    to: Option<&str>,
    available: Option<DateWindow>,
) -> Result<Option<DateWindow>> {
    let from = from.map(parse_date).transpose()?;
    let to = to.map(parse_date).transpose()?;
    let window = match (from, to, available) {
        (None, None, _) => return Ok(None),
        (Some(start), Some(end), _) => DateWindow::new(start, end),
        (Some(start), None, Some(range)) => DateWindow::new(start, range.end),
        (None, Some(end), Some(range)) => DateWindow::new(range.start, end),
        (_, _, None) => return Ok(None),
    };
    if window.is_empty() {
        anyhow::bail!("Window start {} is after window end {}", window.start, window.end);
    }
    Ok(Some(window))
}

fn open_catalog(config: &Config) -> Result<Catalog> {
    let catalog = load_catalog(&config.catalog_path)
        .context("Reference catalog is required for every command")?;
    Ok(catalog.without_names(&config.excluded_names))
}

fn resolve_security<'a>(catalog: &'a Catalog, security: &str) -> Result<&'a SecurityRecord> {
    match catalog.resolve(security) {
        Ok(record) => Ok(record),
        Err(_) => anyhow::bail!(
            "'{}' is not in the catalog. Run 'peerscope list' to see available securities.",
            security
        ),
    }
}

fn pipeline_options(
    config: &Config,
    classification: Option<ClassificationField>,
) -> PipelineOptions {
    let mut options = config.pipeline_options();
    if let Some(field) = classification {
        options.classification = field;
    }
    options
}

fn run_comparison(
    catalog: &Catalog,
    source: &CsvDirectory,
    config: &Config,
    security: &str,
    classification: Option<ClassificationField>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<PeerComparison> {
    let record = resolve_security(catalog, security)?;
    let pipeline = PeerPipeline::new(catalog, source, pipeline_options(config, classification));
    let comparison = pipeline.run(&record.symbol, None)?;

    Ok(
        match resolve_window(from, to, comparison.available_range())? {
            Some(window) => comparison.rewindow(window),
            None => comparison,
        },
    )
}

fn print_peers(peers: &PeerSet) {
    println!(
        "Companies in the same {} as {} ({}):",
        peers.classification,
        peers.selected().display_name,
        peers
            .classification_value
            .as_deref()
            .unwrap_or("unclassified")
    );
    for (i, member) in peers.members().iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        println!("  {} {:<8} {}", marker, member.symbol, member.display_name);
    }
}

fn print_profile(profile: &CompanyProfile) {
    for (label, value) in profile.fields() {
        println!("{:<12} {}", format!("{}:", label), value);
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Commands::InitConfig { force } = cli.command {
        if cli.config.exists() && !force {
            anyhow::bail!(
                "{} already exists. Use --force to overwrite it.",
                cli.config.display()
            );
        }
        config::save_config(&Config::default(), &cli.config)?;
        println!("✅ Wrote default configuration to {}", cli.config.display());
        return Ok(());
    }

    let config = config::load_config_or_default(&cli.config)?.with_env_overrides();
    let catalog = open_catalog(&config)?;
    let source = CsvDirectory::new(&config.prices_dir);

    match cli.command {
        Commands::List {
            filter,
            with_prices,
        } => {
            let priced: Option<HashSet<String>> = if with_prices {
                Some(source.available_symbols()?.into_iter().collect())
            } else {
                None
            };
            let filter = filter.map(|f| f.to_lowercase());
            let mut count = 0;
            for record in catalog.selectable(config.selectable_marker.as_deref()) {
                if let Some(f) = &filter {
                    if !record.display_name.to_lowercase().contains(f) {
                        continue;
                    }
                }
                if let Some(symbols) = &priced {
                    if !symbols.contains(&record.symbol) {
                        continue;
                    }
                }
                println!("{:<8} {}", record.symbol, record.display_name);
                count += 1;
            }
            println!("\n{} securities", count);
        }
        Commands::Peers {
            security,
            classification,
        } => {
            let record = resolve_security(&catalog, &security)?;
            let options = pipeline_options(&config, classification);
            let peers = select_peers(
                &catalog,
                &record.symbol,
                options.classification,
                options.max_peers,
            )?;
            print_peers(&peers);
        }
        Commands::Profile { security } => {
            let record = resolve_security(&catalog, &security)?;
            print_profile(&CompanyProfile::from_record(record));
        }
        Commands::Compare {
            security,
            from,
            to,
            classification,
            json,
        } => {
            let comparison = run_comparison(
                &catalog,
                &source,
                &config,
                &security,
                classification,
                from.as_deref(),
                to.as_deref(),
            )?;
            let summary = comparison.summary();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            print_profile(&comparison.profile());
            println!();
            print_peers(&comparison.peers);
            println!();

            match comparison.window {
                Some(window) => println!("Rebased performance, {} (start = 100):", window),
                None => {
                    println!("⚠️  No price data found for {} or its peers", security);
                    return Ok(());
                }
            }
            println!(
                "  {:<8} {:<40} {:>12} {:>12} {:>10} {:>9}",
                "Symbol", "Name", "Anchor", "Last", "Rebased", "Change"
            );
            for s in &summary {
                println!(
                    "  {:<8} {:<40} {:>12.2} {:>12.2} {:>10.2} {:>8.2}%",
                    s.symbol,
                    truncate(&s.display_name, 40),
                    s.anchor_close,
                    s.last_close,
                    s.last_rebased,
                    s.change_pct
                );
            }
            let missing: Vec<&str> = comparison
                .peers
                .symbols()
                .into_iter()
                .filter(|sym| !summary.iter().any(|s| s.symbol == *sym))
                .collect();
            if !missing.is_empty() {
                println!("\n  No prices in window for: {}", missing.join(", "));
            }
        }
        Commands::Candles { security, since } => {
            let since = parse_date(&since)?;
            let comparison =
                run_comparison(&catalog, &source, &config, &security, None, None, None)?;
            let candles = comparison.candles(Some(since));
            if candles.is_empty() {
                println!("⚠️  No complete OHLC rows for {} since {}", security, since);
                return Ok(());
            }
            println!(
                "{:<10} {:>10} {:>10} {:>10} {:>10}",
                "Date", "Open", "High", "Low", "Close"
            );
            for c in candles {
                println!(
                    "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
                    c.date, c.open, c.high, c.low, c.close
                );
            }
        }
        Commands::Export {
            security,
            from,
            to,
            classification,
            output_dir,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            fs::create_dir_all(&output_dir).with_context(|| {
                format!("Failed to create output directory {}", output_dir.display())
            })?;

            let progress = ProgressBar::new(4);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
                    .progress_chars("=>-"),
            );

            progress.set_message("Building comparison...");
            let comparison = run_comparison(
                &catalog,
                &source,
                &config,
                &security,
                classification,
                from.as_deref(),
                to.as_deref(),
            )?;
            let symbol = comparison.selected_symbol().to_string();
            progress.inc(1);

            progress.set_message("Writing rebased prices...");
            let stem = match comparison.window {
                Some(w) => format!("rebased_{}_{}_to_{}", symbol, w.start, w.end),
                None => format!("rebased_{}", symbol),
            };
            let rebased_path = export::timestamped_path(&output_dir, &stem);
            export::write_rebased_csv(&comparison.rebased, File::create(&rebased_path)?)?;
            progress.inc(1);

            progress.set_message("Writing stock data...");
            let stock_path =
                export::timestamped_path(&output_dir, &format!("stock_data_{}", symbol));
            export::write_price_table_csv(&comparison.series, File::create(&stock_path)?)?;
            progress.inc(1);

            progress.set_message("Writing peer table...");
            let peers_path = export::timestamped_path(&output_dir, &format!("peers_{}", symbol));
            export::write_peer_table_csv(&comparison.peers, File::create(&peers_path)?)?;
            progress.inc(1);
            progress.finish_with_message("Done");

            println!("✅ Rebased prices exported to {}", rebased_path.display());
            println!("✅ Stock data exported to {}", stock_path.display());
            println!("✅ Peer table exported to {}", peers_path.display());
        }
        // Written before the catalog is loaded.
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
