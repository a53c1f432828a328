use crate::suggest;

/// Information about an NLTK data package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub id: &'static str,
    /// Category directory the package unpacks into
    pub subdir: &'static str,
}

/// Registry of known packages
pub const PACKAGES: &[PackageInfo] = &[
    PackageInfo {
        id: "punkt",
        subdir: "tokenizers",
    },
    PackageInfo {
        id: "punkt_tab",
        subdir: "tokenizers",
    },
    PackageInfo {
        id: "averaged_perceptron_tagger",
        subdir: "taggers",
    },
    PackageInfo {
        id: "averaged_perceptron_tagger_eng",
        subdir: "taggers",
    },
    PackageInfo {
        id: "maxent_ne_chunker",
        subdir: "chunkers",
    },
    PackageInfo {
        id: "stopwords",
        subdir: "corpora",
    },
    PackageInfo {
        id: "wordnet",
        subdir: "corpora",
    },
    PackageInfo {
        id: "words",
        subdir: "corpora",
    },
];

impl PackageInfo {
    /// Find package by id
    #[must_use]
    pub fn find(id: &str) -> Option<&'static Self> {
        PACKAGES.iter().find(|p| p.id == id)
    }

    /// Closest known package id, for error messages
    #[must_use]
    pub fn suggest(id: &str) -> Option<&'static str> {
        suggest::closest(id, PACKAGES.iter().map(|p| p.id))
    }

    /// Archive URL under a package server root
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/packages/{}/{}.zip",
            base_url.trim_end_matches('/'),
            self.subdir,
            self.id
        )
    }
}
