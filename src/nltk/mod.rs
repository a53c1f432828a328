//! NLTK data package downloader

pub mod download;
pub mod registry;

pub use download::{InstalledPackage, PackageDownloader};
pub use registry::PackageInfo;

use crate::error::LoadError;
use crate::provision::{Loaded, Loader, ResourceKind, ResourceSpec, StepProgress};
use async_trait::async_trait;

/// Packages downloaded on every run
pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec::new(ResourceKind::Package, "punkt"),
    ResourceSpec::new(ResourceKind::Package, "averaged_perceptron_tagger"),
];

impl Loaded for InstalledPackage {
    fn validate(&self) -> Result<usize, LoadError> {
        if self.files == 0 {
            return Err(LoadError::Decode(format!(
                "Package {} unpacked no files",
                self.id
            )));
        }
        Ok(self.files)
    }
}

pub struct NltkLoader {
    downloader: PackageDownloader,
}

impl NltkLoader {
    #[must_use]
    pub const fn new(downloader: PackageDownloader) -> Self {
        Self { downloader }
    }
}

#[async_trait]
impl Loader for NltkLoader {
    type Handle = InstalledPackage;

    fn name(&self) -> &'static str {
        "nltk"
    }

    async fn load(
        &self,
        resource: &ResourceSpec,
        progress: &StepProgress,
    ) -> Result<InstalledPackage, LoadError> {
        if resource.kind != ResourceKind::Package {
            return Err(LoadError::UnsupportedKind {
                kind: resource.kind,
                loader: "nltk",
            });
        }

        let info = PackageInfo::find(&resource.name).ok_or_else(|| LoadError::UnknownPackage {
            name: resource.name.to_string(),
            suggestion: PackageInfo::suggest(&resource.name),
        })?;

        self.downloader.install(info, progress).await
    }
}
