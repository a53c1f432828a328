use crate::error::LoadError;
use crate::provision::{BatchReport, ResourceSpec, RunResult};

/// Receives progress events from a [`Provisioner`](super::Provisioner)
pub trait Reporter {
    fn batch_started(&self, total: usize);
    fn item_started(&self, index: usize, total: usize, resource: &ResourceSpec);
    fn item_succeeded(&self, index: usize, total: usize, result: &RunResult);
    fn item_failed(&self, index: usize, total: usize, resource: &ResourceSpec, error: &LoadError);
    fn batch_finished(&self, report: &BatchReport);
}

/// Line-oriented output: progress on stdout, failures on stderr
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    /// What the batch provisions, e.g. "tiktoken models and encodings"
    subject: &'static str,
    /// Unit of the validation count, e.g. "tokens"
    unit: &'static str,
}

impl ConsoleReporter {
    #[must_use]
    pub const fn new(subject: &'static str, unit: &'static str) -> Self {
        Self { subject, unit }
    }

    #[must_use]
    pub fn start_line(&self, total: usize) -> String {
        format!("Caching {total} {}...", self.subject)
    }

    #[must_use]
    pub fn item_start_line(index: usize, total: usize, resource: &ResourceSpec) -> String {
        format!("[{index}/{total}] Caching {resource}...")
    }

    #[must_use]
    pub fn success_line(&self, index: usize, total: usize, result: &RunResult) -> String {
        format!(
            "[{index}/{total}] ✓ Cached {} {} ({:.2}s, {} {})",
            result.kind,
            result.name,
            result.elapsed_secs,
            result.count.unwrap_or(0),
            self.unit
        )
    }

    #[must_use]
    pub fn failure_line(
        index: usize,
        total: usize,
        resource: &ResourceSpec,
        error: &LoadError,
    ) -> String {
        format!("[{index}/{total}] ✗ Failed to cache {resource}: {error}")
    }

    #[must_use]
    pub fn summary_line(&self, report: &BatchReport) -> String {
        format!(
            "Finished caching {}: {} of {} succeeded ({} failed)",
            self.subject,
            report.succeeded(),
            report.total(),
            report.failed()
        )
    }
}

impl Reporter for ConsoleReporter {
    fn batch_started(&self, total: usize) {
        println!("{}", self.start_line(total));
    }

    fn item_started(&self, index: usize, total: usize, resource: &ResourceSpec) {
        println!("{}", Self::item_start_line(index, total, resource));
    }

    fn item_succeeded(&self, index: usize, total: usize, result: &RunResult) {
        println!("{}", self.success_line(index, total, result));
    }

    fn item_failed(&self, index: usize, total: usize, resource: &ResourceSpec, error: &LoadError) {
        eprintln!("{}", Self::failure_line(index, total, resource, error));
    }

    fn batch_finished(&self, report: &BatchReport) {
        println!("{}", self.summary_line(report));
    }
}
