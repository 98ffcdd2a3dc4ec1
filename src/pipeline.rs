use tracing::{info, warn};

use crate::db::IndexStore;
use crate::error::PipelineError;
use crate::fetch::PageSource;
use crate::parser::{base_path, AnchorPage, Labeler};
use crate::settings::Category;

pub struct RunReport {
    pub accepted: usize,
    pub rejected: usize,
    pub total: usize,
    /// (category, error) for every category that could not be indexed.
    pub failures: Vec<(String, String)>,
}

impl RunReport {
    pub fn print(&self) {
        println!(
            "Indexed {} entries ({} added, {} duplicates skipped).",
            self.total, self.accepted, self.rejected
        );
        for (category, err) in &self.failures {
            println!("  failed: {} ({})", category, err);
        }
    }
}

/// Fetch, extract, label and insert every category into the index, then
/// commit it. A category that fails leaves no rows behind. The store is
/// closed on every path out of [`Pipeline::run`].
pub struct Pipeline<'a, S> {
    source: &'a S,
    store: IndexStore,
    labeler: Labeler,
    accepted: usize,
    rejected: usize,
}

impl<'a, S: PageSource> Pipeline<'a, S> {
    pub fn new(source: &'a S, store: IndexStore, sequential_category: &str) -> Self {
        Self {
            source,
            store,
            labeler: Labeler::new(sequential_category),
            accepted: 0,
            rejected: 0,
        }
    }

    pub async fn run(mut self, categories: &[Category]) -> Result<RunReport, PipelineError> {
        let mut failures = Vec::new();

        for category in categories {
            self.store.begin_category()?;
            match self.index_category(category).await {
                Ok((accepted, rejected)) => {
                    self.store.commit_category()?;
                    self.accepted += accepted;
                    self.rejected += rejected;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    self.store.rollback_category()?;
                    warn!(category = %category.name, "Skipping category, entries rolled back: {}", e);
                    failures.push((category.name.clone(), e.to_string()));
                }
            }
        }

        let total = self.store.count()?;
        info!("{} entry.", total);
        self.store.finalize()?;

        Ok(RunReport {
            accepted: self.accepted,
            rejected: self.rejected,
            total,
            failures,
        })
    }

    /// Returns (accepted, rejected) for the category.
    async fn index_category(
        &mut self,
        category: &Category,
    ) -> Result<(usize, usize), PipelineError> {
        let base = base_path(&category.url)
            .ok_or_else(|| PipelineError::BasePath(category.url.clone()))?;
        let html = self
            .source
            .fetch(&category.url)
            .await
            .map_err(|source| PipelineError::Fetch {
                url: category.url.clone(),
                source,
            })?;

        let page = AnchorPage::parse(&html, base);
        let (mut accepted, mut rejected) = (0, 0);
        for candidate in page.candidates() {
            let name = self.labeler.apply(&category.name, candidate.name)?;
            if self.store.try_insert(&name, &category.name, &candidate.path)? {
                info!(
                    "DB add >> name: {} | type: {} | path: {}",
                    name, category.name, candidate.path
                );
                accepted += 1;
            } else {
                info!(name = %name, path = %candidate.path, "record exists");
                rejected += 1;
            }
        }
        Ok((accepted, rejected))
    }
}
