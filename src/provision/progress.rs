//! Per-item progress bar (init → fetch → validate)

use indicatif::{ProgressBar, ProgressStyle};

/// Sub-steps of loading one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Init,
    Fetch,
    Validate,
}

impl Step {
    const COUNT: u64 = 3;

    const fn position(self) -> u64 {
        match self {
            Self::Init => 0,
            Self::Fetch => 1,
            Self::Validate => 2,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Init => "initializing",
            Self::Fetch => "loading",
            Self::Validate => "validating",
        }
    }
}

/// Cosmetic progress display for one resource. Never affects control flow.
pub struct StepProgress {
    bar: ProgressBar,
}

impl StepProgress {
    /// Bar drawn to stderr; indicatif hides it when stderr is not a terminal
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let style = ProgressStyle::default_bar()
            .template("{prefix}: [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");

        let bar = ProgressBar::new(Step::COUNT);
        bar.set_style(style);
        bar.set_prefix(prefix.to_string());

        Self { bar }
    }

    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn step(&self, step: Step) {
        self.bar.set_position(step.position());
        self.bar.set_message(step.label());
    }

    /// Show bytes received during the fetch step
    pub fn bytes(&self, received: u64, total: Option<u64>) {
        let msg = match total {
            Some(total) => format!("{} / {}", format_bytes(received), format_bytes(total)),
            None => format_bytes(received),
        };
        self.bar.set_message(msg);
    }

    pub fn finish(&self) {
        self.bar.set_position(Step::COUNT);
        self.bar.finish_with_message("done");
    }

    pub fn abandon(&self) {
        self.bar.abandon_with_message("failed");
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Byte count with a binary unit, e.g. `1.50 MB`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}
