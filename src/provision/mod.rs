//! Batch provisioning of named resources into a local cache
//!
//! A [`Provisioner`] walks a fixed list of [`ResourceSpec`]s in order, hands
//! each one to a [`Loader`], validates the returned handle and reports the
//! outcome through a [`Reporter`]. A failing resource is reported and skipped;
//! the batch always runs to the end.

pub mod progress;
pub mod report;

pub use progress::{Step, StepProgress};
pub use report::{ConsoleReporter, Reporter};

use crate::error::LoadError;
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::time::Instant;

/// What a resource name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A model name, resolved to its encoding
    Model,
    /// An encoding name
    Encoding,
    /// A corpus package id
    Package,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Model => "model",
            Self::Encoding => "encoding",
            Self::Package => "package",
        })
    }
}

/// A named resource to provision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub name: Cow<'static, str>,
}

impl ResourceSpec {
    #[must_use]
    pub const fn new(kind: ResourceKind, name: &'static str) -> Self {
        Self {
            kind,
            name: Cow::Borrowed(name),
        }
    }

    #[must_use]
    pub fn model(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: ResourceKind::Model,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn encoding(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: ResourceKind::Encoding,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn package(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: ResourceKind::Package,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Outcome of provisioning one resource
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub kind: ResourceKind,
    pub name: String,
    pub succeeded: bool,
    pub elapsed_secs: f64,
    pub error: Option<String>,
    /// Validation metric: token count or file count
    pub count: Option<usize>,
}

impl RunResult {
    fn success(resource: &ResourceSpec, elapsed_secs: f64, count: usize) -> Self {
        Self {
            kind: resource.kind,
            name: resource.name.to_string(),
            succeeded: true,
            elapsed_secs,
            error: None,
            count: Some(count),
        }
    }

    fn failure(resource: &ResourceSpec, elapsed_secs: f64, error: &LoadError) -> Self {
        Self {
            kind: resource.kind,
            name: resource.name.to_string(),
            succeeded: false,
            elapsed_secs,
            error: Some(error.to_string()),
            count: None,
        }
    }
}

/// Ordered outcomes of one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub results: Vec<RunResult>,
}

impl BatchReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// True when the batch was non-empty and nothing succeeded
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.total() > 0 && self.succeeded() == 0
    }
}

/// A loaded resource that can prove it is usable
pub trait Loaded: Send {
    /// Exercise the resource and return a positive count on success
    fn validate(&self) -> Result<usize, LoadError>;
}

/// Fetches or reads from cache one kind of resource
#[async_trait]
pub trait Loader: Send + Sync {
    type Handle: Loaded;

    /// Short name used in messages, e.g. "tiktoken"
    fn name(&self) -> &'static str;

    async fn load(
        &self,
        resource: &ResourceSpec,
        progress: &StepProgress,
    ) -> Result<Self::Handle, LoadError>;
}

/// Runs resources through a loader one at a time
pub struct Provisioner<L, R> {
    loader: L,
    reporter: R,
    show_progress: bool,
}

impl<L: Loader, R: Reporter> Provisioner<L, R> {
    pub const fn new(loader: L, reporter: R) -> Self {
        Self {
            loader,
            reporter,
            show_progress: true,
        }
    }

    /// Enable or disable the per-item progress bar
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub const fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Provision every resource in order. Never stops early.
    pub async fn run(&self, resources: &[ResourceSpec]) -> BatchReport {
        let total = resources.len();
        self.reporter.batch_started(total);
        tracing::info!("Provisioning {total} resource(s) with {} loader", self.loader.name());

        let mut report = BatchReport {
            results: Vec::with_capacity(total),
        };
        for (i, resource) in resources.iter().enumerate() {
            let result = self.provision(i + 1, total, resource).await;
            report.results.push(result);
        }

        self.reporter.batch_finished(&report);
        report
    }

    /// Provision a single resource outside of any list
    pub async fn run_single(&self, resource: &ResourceSpec) -> RunResult {
        self.provision(1, 1, resource).await
    }

    async fn provision(&self, index: usize, total: usize, resource: &ResourceSpec) -> RunResult {
        let start = Instant::now();
        self.reporter.item_started(index, total, resource);

        let progress = if self.show_progress {
            StepProgress::new(&resource.to_string())
        } else {
            StepProgress::hidden()
        };

        let outcome = self.load_and_validate(resource, &progress).await;
        let elapsed_secs = start.elapsed().as_secs_f64();

        match outcome {
            Ok(count) => {
                progress.finish();
                let result = RunResult::success(resource, elapsed_secs, count);
                tracing::info!(
                    "Provisioned {resource} in {elapsed_secs:.2}s (count {count})"
                );
                self.reporter.item_succeeded(index, total, &result);
                result
            }
            Err(e) => {
                progress.abandon();
                tracing::warn!("Failed to provision {resource}: {e}");
                self.reporter.item_failed(index, total, resource, &e);
                RunResult::failure(resource, elapsed_secs, &e)
            }
        }
    }

    async fn load_and_validate(
        &self,
        resource: &ResourceSpec,
        progress: &StepProgress,
    ) -> Result<usize, LoadError> {
        progress.step(Step::Init);
        progress.step(Step::Fetch);
        let handle = self.loader.load(resource, progress).await?;

        progress.step(Step::Validate);
        handle.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_display() {
        assert_eq!(ResourceSpec::model("gpt-4").to_string(), "model gpt-4");
        assert_eq!(
            ResourceSpec::new(ResourceKind::Encoding, "cl100k_base").to_string(),
            "encoding cl100k_base"
        );
        assert_eq!(
            ResourceSpec::package(String::from("punkt")).to_string(),
            "package punkt"
        );
    }

    #[test]
    fn test_batch_report_counts() {
        let ok = RunResult::success(&ResourceSpec::encoding("a"), 0.5, 4);
        let bad = RunResult::failure(
            &ResourceSpec::encoding("b"),
            0.1,
            &LoadError::UnknownModel("b".to_string()),
        );

        let report = BatchReport {
            results: vec![ok.clone(), bad.clone()],
        };
        assert_eq!(report.total(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_failed());

        let report = BatchReport { results: vec![bad] };
        assert!(report.all_failed());

        assert!(!BatchReport::default().all_failed());
        assert_eq!(ok.count, Some(4));
    }

    #[test]
    fn test_failure_keeps_error_text() {
        let result = RunResult::failure(
            &ResourceSpec::model("gpt-9"),
            0.0,
            &LoadError::UnknownModel("gpt-9".to_string()),
        );
        assert!(!result.succeeded);
        assert!(result.error.unwrap().contains("gpt-9"));
        assert!(result.count.is_none());
    }
}
