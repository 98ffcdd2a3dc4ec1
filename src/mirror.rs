use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux i686) AppleWebKit/535.19 (KHTML, like Gecko) Ubuntu/11.10 Chromium/18.0.1025.168";

/// Resource filters: pull in styles, fonts, images and scripts, skip GitHub
/// except raw content.
const FILTERS: &[&str] = &[
    "-*",
    "+*.css",
    "+*css.php",
    "+*.ico",
    "+*/fonts/*",
    "+*.svg",
    "+*.ttf",
    "+fonts.googleapis.com*",
    "+*.woff",
    "+*.eot",
    "+*.png",
    "+*.jpg",
    "+*.gif",
    "+*.jpeg",
    "+*.js",
];

/// Copies a whole site into a bundle's Documents directory.
pub trait Mirror {
    async fn mirror(&self, site_url: &str, bundle_root: &Path, documents: &Path) -> Result<()>;
}

/// Mirrors with the external `httrack` tool.
pub struct Httrack;

impl Mirror for Httrack {
    async fn mirror(&self, site_url: &str, bundle_root: &Path, documents: &Path) -> Result<()> {
        info!("Mirroring {} with httrack", site_url);
        let status = tokio::process::Command::new("httrack")
            .args(httrack_args(site_url))
            .current_dir(bundle_root)
            .status()
            .await
            .context("Failed to run httrack")?;
        if !status.success() {
            bail!("httrack exited with {}", status);
        }
        let moved = relocate(bundle_root, documents)?;
        info!("Mirrored {} top-level entries into {:?}", moved, documents);
        Ok(())
    }
}

fn httrack_args(site_url: &str) -> Vec<String> {
    let mut args: Vec<String> = [
        "-%v2",
        "-T60",
        "-R99",
        "--sockets=7",
        "-%c1000",
        "-c10",
        "-A999999999",
        "-%N0",
        "--disable-security-limits",
        "-F",
        BROWSER_AGENT,
        "--mirror",
        "--keep-alive",
        "--robots=0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(site_url.to_string());
    args.push("-n".to_string());
    args.extend(FILTERS.iter().map(|s| s.to_string()));
    args.push(format!("+{}*", site_url));
    args.push("-github.com*".to_string());
    args.push("+raw.github.com*".to_string());
    args
}

/// Remove httrack's `hts-*` bookkeeping from `root` and move every other
/// dotted entry (mirrored host directories, index.html) into `documents`.
fn relocate(root: &Path, documents: &Path) -> Result<usize> {
    let mut moved = 0;
    for entry in fs::read_dir(root).with_context(|| format!("Failed to list {:?}", root))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();
        if name.starts_with("hts-") {
            debug!("Removing {:?}", path);
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            continue;
        }
        if !name.contains('.') || name == "icon.png" {
            continue;
        }
        let dest = documents.join(&name);
        if dest.is_dir() {
            fs::remove_dir_all(&dest)?;
        } else if dest.exists() {
            fs::remove_file(&dest)?;
        }
        fs::rename(&path, &dest).with_context(|| format!("Failed to move {:?}", path))?;
        moved += 1;
    }
    Ok(moved)
}
