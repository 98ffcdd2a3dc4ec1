use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../docset.toml");

/// One named partition of the target site and the page that lists its entries.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub name: String,
    pub index_page: String,
    pub icon_url: String,
    pub family: String,
    /// Entries from this category get an ordinal prefix.
    pub sequential_category: String,
    pub output_dir: PathBuf,
    pub fetch_timeout_secs: u64,
    pub categories: Vec<Category>,
}

impl Settings {
    /// Embedded defaults, then the optional file, then `DOCSET_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(p) = path {
            builder = builder.add_source(File::from(p).required(true));
        }
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("DOCSET")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            bail!("No page categories configured");
        }
        let mut seen = HashSet::new();
        for c in &self.categories {
            if !seen.insert(c.name.as_str()) {
                bail!("Duplicate page category: {}", c.name);
            }
            if !c.url.contains("//") {
                bail!("Category {} has no scheme in its URL: {}", c.name, c.url);
            }
        }
        if !self.index_page.contains("//") {
            bail!("Index page has no scheme: {}", self.index_page);
        }
        Ok(())
    }

    pub fn bundle_root(&self) -> PathBuf {
        self.output_dir.join(format!("{}.docset", self.name))
    }
}
