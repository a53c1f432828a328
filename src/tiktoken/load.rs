use crate::error::LoadError;
use crate::fetch::fetch_bytes;
use crate::provision::StepProgress;
use crate::tiktoken::bpe::{Rank, Ranks};
use base64::Engine;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Downloaded encoding files, keyed by the SHA-1 of their URL
///
/// The layout matches what the Python `tiktoken` package reads from
/// `TIKTOKEN_CACHE_DIR`, so a warmed directory serves both.
pub struct BlobCache {
    dir: PathBuf,
    client: reqwest::Client,
}

impl BlobCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            dir: dir.into(),
            client,
        }
    }

    /// Path a URL is cached at
    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(cache_key(url))
    }

    /// Read `url` from the cache, fetching it on a miss or a hash mismatch
    pub async fn read(
        &self,
        url: &str,
        expected_sha256: Option<&str>,
        progress: &StepProgress,
    ) -> Result<Vec<u8>, LoadError> {
        let path = self.path_for(url);

        match fs::read(&path) {
            Ok(data) if expected_sha256.map_or(true, |hash| sha256_hex(&data) == hash) => {
                tracing::debug!("Cache hit for {url} at {}", path.display());
                return Ok(data);
            }
            Ok(_) => {
                tracing::warn!(
                    "Cached copy of {url} at {} failed its hash check, refetching",
                    path.display()
                );
                if let Err(e) = fs::remove_file(&path) {
                    tracing::debug!("Could not remove stale cache file: {e}");
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::debug!("Cannot read cache file {}: {e}", path.display()),
        }

        let data = fetch_bytes(&self.client, url, progress).await?;

        if let Some(expected) = expected_sha256 {
            let actual = sha256_hex(&data);
            if actual != expected {
                return Err(LoadError::HashMismatch {
                    url: url.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        self.store(&path, &data)?;
        Ok(data)
    }

    /// Write via a temporary file in the cache dir, then rename into place
    fn store(&self, path: &Path, data: &[u8]) -> Result<(), LoadError> {
        fs::create_dir_all(&self.dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(data)?;
        tmp.persist(path).map_err(|e| LoadError::Io(e.error))?;

        tracing::debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(())
    }
}

/// Hex SHA-1 of a URL
#[must_use]
pub fn cache_key(url: &str) -> String {
    format!("{:x}", Sha1::digest(url.as_bytes()))
}

#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Parse a `.tiktoken` file
pub fn parse_tiktoken_bpe(data: &[u8]) -> Result<Ranks, LoadError> {
    let engine = base64::engine::general_purpose::STANDARD;
    let mut ranks = Ranks::new();

    for (line_no, line) in data.split(|&b| b == b'\n').enumerate() {
        if line.is_empty() {
            continue;
        }

        let malformed = || LoadError::Decode(format!("Malformed rank line {}", line_no + 1));

        let mut fields = line.split(|&b| b == b' ');
        let (Some(token), Some(rank), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed());
        };

        let token = engine.decode(token).map_err(|_| malformed())?;
        let rank: Rank = std::str::from_utf8(rank)
            .ok()
            .and_then(|r| r.trim_end_matches('\r').parse().ok())
            .ok_or_else(malformed)?;

        ranks.insert(token, rank);
    }

    Ok(ranks)
}

/// Map from the printable characters GPT-2 uses to stand in for raw bytes
fn data_gym_byte_table() -> HashMap<char, u8> {
    let is_printable = |b: u8| matches!(b, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF);

    let mut table = HashMap::with_capacity(256);
    let mut shifted = 0u32;
    for b in 0..=255u8 {
        if is_printable(b) {
            table.insert(char::from(b), b);
        } else {
            // Non-printable bytes are moved past the Latin-1 range, in order
            if let Some(c) = char::from_u32(256 + shifted) {
                table.insert(c, b);
            }
            shifted += 1;
        }
    }
    table
}

fn rank_order() -> Vec<u8> {
    let is_printable = |b: u8| matches!(b, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF);
    (0..=255u8)
        .filter(|&b| is_printable(b))
        .chain((0..=255u8).filter(|&b| !is_printable(b)))
        .collect()
}

/// Build ranks from GPT-2 `vocab.bpe` merges and check them against `encoder.json`
pub fn parse_data_gym(vocab_bpe: &[u8], encoder_json: &[u8]) -> Result<Ranks, LoadError> {
    let table = data_gym_byte_table();
    let decode = |value: &str| -> Result<Vec<u8>, LoadError> {
        value
            .chars()
            .map(|c| {
                table.get(&c).copied().ok_or_else(|| {
                    LoadError::Decode(format!("Unexpected character {c:?} in BPE data"))
                })
            })
            .collect()
    };

    let mut ranks: Ranks = rank_order()
        .into_iter()
        .zip(0..)
        .map(|(b, rank)| (vec![b], rank))
        .collect();

    let vocab = std::str::from_utf8(vocab_bpe)
        .map_err(|e| LoadError::Decode(format!("vocab.bpe is not UTF-8: {e}")))?;

    // First line is a version header
    let mut next_rank = Rank::try_from(ranks.len()).unwrap_or(Rank::MAX);
    for line in vocab.lines().skip(1).filter(|l| !l.is_empty()) {
        let Some((first, second)) = line.split_once(' ') else {
            return Err(LoadError::Decode(format!("Malformed merge line '{line}'")));
        };
        let mut merged = decode(first)?;
        merged.extend(decode(second)?);
        ranks.insert(merged, next_rank);
        next_rank += 1;
    }

    let encoder: HashMap<String, Rank> = serde_json::from_slice(encoder_json)
        .map_err(|e| LoadError::Decode(format!("encoder.json is malformed: {e}")))?;

    let mut from_encoder = Ranks::with_capacity(encoder.len());
    for (token, rank) in encoder {
        if token == "<|endoftext|>" || token == "<|startoftext|>" {
            continue;
        }
        from_encoder.insert(decode(&token)?, rank);
    }

    if from_encoder != ranks {
        return Err(LoadError::Decode(
            "encoder.json does not match vocab.bpe".to_string(),
        ));
    }

    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_sha1_of_url() {
        // sha1("abc")
        assert_eq!(cache_key("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_parse_tiktoken_bpe() {
        // "!" = IQ==, "ab" = YWI=
        let ranks = parse_tiktoken_bpe(b"IQ== 0\nYWI= 1\n").unwrap();
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks.get(b"!".as_slice()), Some(&0));
        assert_eq!(ranks.get(b"ab".as_slice()), Some(&1));
    }

    #[test]
    fn test_parse_tiktoken_bpe_rejects_garbage() {
        assert!(parse_tiktoken_bpe(b"IQ==\n").is_err());
        assert!(parse_tiktoken_bpe(b"IQ== x\n").is_err());
        assert!(parse_tiktoken_bpe(b"!!! 0\n").is_err());
    }

    #[test]
    fn test_byte_table_covers_every_byte() {
        let table = data_gym_byte_table();
        assert_eq!(table.len(), 256);
        assert_eq!(table.get(&'a'), Some(&b'a'));
        // space is shifted: 0x00..=0x20 are the first 33 non-printables
        assert_eq!(table.get(&'\u{120}'), Some(&b' '));
        assert_eq!(table.get(&'\u{100}'), Some(&0u8));
    }

    #[test]
    fn test_parse_data_gym() {
        let order = rank_order();
        let mut encoder: HashMap<String, Rank> = HashMap::new();
        let table = data_gym_byte_table();
        let byte_to_char: HashMap<u8, char> = table.iter().map(|(&c, &b)| (b, c)).collect();
        for (rank, b) in (0..).zip(order.iter()) {
            encoder.insert(byte_to_char[b].to_string(), rank);
        }
        // merge "Ġ" + "w" is " w"
        encoder.insert("\u{120}w".to_string(), 256);
        encoder.insert("<|endoftext|>".to_string(), 257);
        let encoder_json = serde_json::to_vec(&encoder).unwrap();

        let vocab_bpe = "#version: 0.2\n\u{120} w\n";
        let ranks = parse_data_gym(vocab_bpe.as_bytes(), &encoder_json).unwrap();

        assert_eq!(ranks.len(), 257);
        assert_eq!(ranks.get(b" w".as_slice()), Some(&256));
        assert_eq!(ranks.get(b"!".as_slice()), Some(&0));
    }

    #[test]
    fn test_parse_data_gym_detects_mismatch() {
        let encoder_json = br#"{"!": 5}"#;
        let result = parse_data_gym(b"#version: 0.2\n", encoder_json);
        assert!(result.is_err());
    }
}
