//! Library entry point
//!
//! [`SurchClient`] ties the pipeline together: resolve the reference, bring the
//! working copy up to date, enumerate commits, search each one, and append one
//! record per matching file to the organization's result store.

use crate::config::Config;
use crate::error::Result;
use crate::git::{GitBackend, GitCli};
use crate::scan::SearchTerms;
use crate::types::{SearchReport, SearchRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod pipeline;

/// Client for searching repository history
///
/// # Example
///
/// ```no_run
/// use surch::{SearchRequest, SurchClient};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = SurchClient::new()?;
///     let request = SearchRequest::new(":nir0s/surch", vec!["password".to_string()]);
///     let report = client.search(request, CancellationToken::new()).await?;
///     println!("{} records in {}", report.records_written, report.results_path.display());
///     Ok(())
/// }
/// ```
pub struct SurchClient<B: GitBackend + 'static = GitCli> {
    pub(crate) config: Arc<Config>,
    pub(crate) backend: Arc<B>,
    pub(crate) span: tracing::Span,
}

impl<B: GitBackend + 'static> Clone for SurchClient<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            backend: Arc::clone(&self.backend),
            span: self.span.clone(),
        }
    }
}

impl SurchClient<GitCli> {
    /// Client using the configuration file (if any) plus `SURCH_*` overrides
    pub fn new() -> Result<Self> {
        Self::with_config(Config::new()?)
    }

    /// Client with a custom configuration, running the `git` on `PATH`
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_backend(config, GitCli::default()))
    }
}

impl<B: GitBackend + 'static> SurchClient<B> {
    /// Client over any [`GitBackend`]
    pub fn with_backend(config: Config, backend: B) -> Self {
        tracing::debug!(
            "Initializing client: base_url={}, workers={}, clones in {}",
            config.base_url(),
            config.scan.workers,
            config.paths.clones_dir.display()
        );
        Self {
            config: Arc::new(config),
            backend: Arc::new(backend),
            span: tracing::Span::none(),
        }
    }

    /// Run every pipeline stage inside `span`
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Search a repository's full history for the request's terms
    ///
    /// Terms are validated before anything touches the disk or network. The
    /// pipeline itself runs on the blocking thread pool. When `cancel` fires, or
    /// `scan.timeout_secs` elapses, no further commits are scanned; whatever was
    /// found is still written and the call returns
    /// [`crate::SurchError::Interrupted`] with the partial report.
    pub async fn search(&self, request: SearchRequest, cancel: CancellationToken) -> Result<SearchReport> {
        SearchTerms::new(request.search_terms.clone())?;

        let token = cancel.child_token();
        let deadline = match self.config.scan.timeout_secs {
            0 => None,
            secs => {
                let token = token.clone();
                Some(tokio::spawn(async move {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                            tracing::warn!("Search deadline of {}s reached, stopping scan", secs);
                            token.cancel();
                        }
                        _ = token.cancelled() => {}
                    }
                }))
            }
        };

        let client = self.clone();
        let result =
            tokio::task::spawn_blocking(move || client.search_blocking(&request, &token)).await;

        if let Some(handle) = deadline {
            handle.abort();
        }

        result.map_err(|e| crate::SurchError::other(format!("Search task failed: {}", e)))?
    }
}
