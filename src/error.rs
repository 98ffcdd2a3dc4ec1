use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("ordinal labels exhausted after {0} entries (\"aa\" through \"zz\")")]
    Exhausted(usize),
}

/// Failure while indexing one page category.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch {url}: {source:#}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("cannot derive a base path from {0}")]
    BasePath(String),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error("index store: {0}")]
    Store(#[from] rusqlite::Error),
}

impl PipelineError {
    /// Store failures end the run; anything else only loses its category.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Store(_))
    }
}
