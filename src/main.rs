mod bundle;
mod db;
mod error;
mod fetch;
mod mirror;
mod parser;
mod pipeline;
mod settings;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use bundle::Bundle;
use db::IndexStore;
use fetch::HttpSource;
use mirror::{Httrack, Mirror};
use pipeline::Pipeline;
use settings::Settings;

#[derive(Parser)]
#[command(name = "docset_builder", about = "Build an offline docset from a Sphinx documentation site")]
struct Cli {
    /// TOML file layered over the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the bundle, write Info.plist, index every category, fetch the icon
    Build {
        /// Also mirror the whole site into Documents/ with httrack
        #[arg(long)]
        mirror: bool,
        /// Don't download the icon
        #[arg(long)]
        skip_icon: bool,
    },
    /// Show entry counts of an existing bundle
    Stats,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Build { mirror, skip_icon } => build(&settings, mirror, skip_icon).await,
        Commands::Stats => stats(&settings),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn build(settings: &Settings, mirror: bool, skip_icon: bool) -> Result<()> {
    let bundle = Bundle::new(settings.bundle_root());
    bundle.create()?;
    println!("Bundle: {}", bundle.root().display());

    if mirror {
        if let Err(e) = Httrack
            .mirror(&settings.index_page, bundle.root(), &bundle.documents_dir())
            .await
        {
            warn!("Mirroring failed, continuing with the index: {:#}", e);
        }
    }

    bundle.write_info_plist(settings)?;

    let index_path = bundle.index_path();
    let store = IndexStore::open(&index_path)
        .with_context(|| format!("Failed to open index {:?}", index_path))?;
    store.initialize().context("Failed to initialize search index")?;

    let source = HttpSource::new(Duration::from_secs(settings.fetch_timeout_secs))?;
    let report = Pipeline::new(&source, store, &settings.sequential_category)
        .run(&settings.categories)
        .await?;

    if !skip_icon {
        if let Err(e) = source.download(&settings.icon_url, &bundle.icon_path()).await {
            warn!("Icon download failed: {:#}", e);
        }
    }

    report.print();
    Ok(())
}

fn stats(settings: &Settings) -> Result<()> {
    let bundle = Bundle::new(settings.bundle_root());
    let index_path = bundle.index_path();
    if !index_path.is_file() {
        bail!("No index at {:?}. Run 'build' first.", index_path);
    }

    if let Ok(plist) = bundle::read_info_plist(&bundle.plist_path()) {
        for (key, value) in plist {
            if key == "CFBundleName" || key == "dashIndexFilePath" {
                println!("{:<18} {}", key, value);
            }
        }
    } else {
        info!("No readable Info.plist in {:?}", bundle.root());
    }

    let store = IndexStore::open(&index_path)?;
    println!("Entries:           {}", store.count()?);
    for (kind, n) in store.count_by_type()? {
        println!("  {:<16} {}", kind, n);
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
