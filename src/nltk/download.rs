use crate::error::LoadError;
use crate::fetch::fetch_bytes;
use crate::nltk::registry::PackageInfo;
use crate::provision::StepProgress;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

/// A package present on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub id: String,
    pub path: PathBuf,
    pub files: usize,
    /// False when the package was already installed
    pub downloaded: bool,
}

/// Downloads package archives and unpacks them into a data directory
pub struct PackageDownloader {
    client: reqwest::Client,
    data_dir: PathBuf,
    base_url: String,
}

impl PackageDownloader {
    #[must_use]
    pub fn new(client: reqwest::Client, data_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            data_dir: data_dir.into(),
            base_url: base_url.into(),
        }
    }

    /// Directory a package unpacks to
    #[must_use]
    pub fn package_dir(&self, info: &PackageInfo) -> PathBuf {
        self.data_dir.join(info.subdir).join(info.id)
    }

    /// Path the downloaded archive is kept at
    #[must_use]
    pub fn archive_path(&self, info: &PackageInfo) -> PathBuf {
        self.data_dir.join(info.subdir).join(format!("{}.zip", info.id))
    }

    /// Install `info` unless it is already unpacked
    pub async fn install(
        &self,
        info: &PackageInfo,
        progress: &StepProgress,
    ) -> Result<InstalledPackage, LoadError> {
        let package_dir = self.package_dir(info);

        let existing = count_files(&package_dir);
        if existing > 0 {
            tracing::info!("Package {} already up to date at {}", info.id, package_dir.display());
            return Ok(InstalledPackage {
                id: info.id.to_string(),
                path: package_dir,
                files: existing,
                downloaded: false,
            });
        }

        let url = info.url(&self.base_url);
        let archive = fetch_bytes(&self.client, &url, progress).await?;

        let category_dir = self.data_dir.join(info.subdir);
        fs::create_dir_all(&category_dir)?;

        let archive_path = self.archive_path(info);
        let mut tmp = tempfile::NamedTempFile::new_in(&category_dir)?;
        tmp.write_all(&archive)?;
        tmp.persist(&archive_path).map_err(|e| LoadError::Io(e.error))?;

        let files = unpack(&archive, &category_dir, info.id)?;
        tracing::info!("Unpacked {files} file(s) of {} into {}", info.id, package_dir.display());

        Ok(InstalledPackage {
            id: info.id.to_string(),
            path: package_dir,
            files,
            downloaded: true,
        })
    }
}

/// Unpack `archive` into a staging directory next to `<category_dir>/<id>`
/// and move the package into place once every entry is written. A failed
/// unpack leaves no package directory behind.
fn unpack(archive: &[u8], category_dir: &Path, id: &str) -> Result<usize, LoadError> {
    let staging = tempfile::TempDir::new_in(category_dir)?;
    extract(archive, staging.path())?;

    let staged = staging.path().join(id);
    let files = count_files(&staged);
    if files == 0 {
        return Err(LoadError::Decode(format!(
            "Archive for {id} has no files under {id}/"
        )));
    }

    let package_dir = category_dir.join(id);
    if package_dir.exists() {
        fs::remove_dir_all(&package_dir)?;
    }
    fs::rename(&staged, &package_dir)?;

    Ok(files)
}

/// Unpack a zip archive under `dest`, returning the number of files written
fn extract(archive: &[u8], dest: &Path) -> Result<usize, LoadError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut files = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;

        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!("Skipping archive entry outside target: {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out)?;
        files += 1;
    }

    Ok(files)
}

/// Regular files under `dir`; zero when it does not exist
fn count_files(dir: &Path) -> usize {
    if !dir.is_dir() {
        return 0;
    }

    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}
