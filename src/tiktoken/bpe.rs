//! Byte pair encoder over a table of mergeable ranks

use crate::error::LoadError;
use fancy_regex::Regex;
use std::collections::HashMap;

pub type Rank = u32;

/// Mergeable token bytes → rank
pub type Ranks = HashMap<Vec<u8>, Rank>;

/// Encoder built from mergeable ranks, special tokens and a split pattern
#[derive(Debug)]
pub struct CoreBpe {
    encoder: Ranks,
    decoder: HashMap<Rank, Vec<u8>>,
    special_tokens: HashMap<String, Rank>,
    pattern: Regex,
}

impl CoreBpe {
    pub fn new(
        encoder: Ranks,
        special_tokens: HashMap<String, Rank>,
        pattern: &str,
    ) -> Result<Self, LoadError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| LoadError::Decode(format!("Invalid split pattern: {e}")))?;

        let decoder: HashMap<Rank, Vec<u8>> = encoder
            .iter()
            .map(|(bytes, &rank)| (rank, bytes.clone()))
            .collect();

        if decoder.len() != encoder.len() {
            return Err(LoadError::Decode(
                "Mergeable ranks contain duplicate rank values".to_string(),
            ));
        }

        Ok(Self {
            encoder,
            decoder,
            special_tokens,
            pattern,
        })
    }

    /// Mergeable plus special token count
    #[must_use]
    pub fn n_vocab(&self) -> usize {
        self.encoder.len() + self.special_tokens.len()
    }

    #[must_use]
    pub fn special_token(&self, name: &str) -> Option<Rank> {
        self.special_tokens.get(name).copied()
    }

    /// Encode `text`, treating special token text as ordinary text
    pub fn encode_ordinary(&self, text: &str) -> Result<Vec<Rank>, LoadError> {
        let mut tokens = Vec::new();

        for piece in self.pattern.find_iter(text) {
            let piece = piece
                .map_err(|e| LoadError::Decode(format!("Split pattern failed: {e}")))?
                .as_str()
                .as_bytes();

            match self.encoder.get(piece) {
                Some(&rank) => tokens.push(rank),
                None => tokens.extend(byte_pair_encode(piece, &self.encoder)?),
            }
        }

        Ok(tokens)
    }

    /// Number of tokens `text` encodes to
    pub fn token_count(&self, text: &str) -> Result<usize, LoadError> {
        Ok(self.encode_ordinary(text)?.len())
    }

    /// Decode tokens back to bytes
    pub fn decode_bytes(&self, tokens: &[Rank]) -> Result<Vec<u8>, LoadError> {
        let mut out = Vec::with_capacity(tokens.len() * 2);
        let special: HashMap<Rank, &str> = self
            .special_tokens
            .iter()
            .map(|(text, &rank)| (rank, text.as_str()))
            .collect();

        for token in tokens {
            if let Some(bytes) = self.decoder.get(token) {
                out.extend_from_slice(bytes);
            } else if let Some(text) = special.get(token) {
                out.extend_from_slice(text.as_bytes());
            } else {
                return Err(LoadError::Decode(format!("Unknown token {token}")));
            }
        }

        Ok(out)
    }

    /// Decode tokens to a string, replacing invalid UTF-8
    pub fn decode(&self, tokens: &[Rank]) -> Result<String, LoadError> {
        Ok(String::from_utf8_lossy(&self.decode_bytes(tokens)?).into_owned())
    }
}

/// Merge the lowest-ranked adjacent pair until no pair has a rank.
///
/// Returns the boundaries of the final parts: `(start, _)` entries, the last
/// one marking `piece.len()`.
fn byte_pair_merge(ranks: &Ranks, piece: &[u8]) -> Vec<(usize, Rank)> {
    let rank_of = |range: std::ops::Range<usize>| ranks.get(&piece[range]).copied().unwrap_or(Rank::MAX);

    let mut parts: Vec<(usize, Rank)> = Vec::with_capacity(piece.len() + 1);
    let mut min_rank: (Rank, usize) = (Rank::MAX, usize::MAX);
    for i in 0..piece.len() - 1 {
        let rank = rank_of(i..i + 2);
        if rank < min_rank.0 {
            min_rank = (rank, i);
        }
        parts.push((i, rank));
    }
    parts.push((piece.len() - 1, Rank::MAX));
    parts.push((piece.len(), Rank::MAX));

    // rank of the part formed by merging parts[i] and parts[i + 1]
    let pair_rank = |parts: &[(usize, Rank)], i: usize| {
        if i + 3 < parts.len() {
            rank_of(parts[i].0..parts[i + 3].0)
        } else {
            Rank::MAX
        }
    };

    while min_rank.0 != Rank::MAX {
        let i = min_rank.1;
        if i > 0 {
            parts[i - 1].1 = pair_rank(&parts, i - 1);
        }
        parts[i].1 = pair_rank(&parts, i);
        parts.remove(i + 1);

        min_rank = (Rank::MAX, usize::MAX);
        for (j, &(_, rank)) in parts[..parts.len() - 1].iter().enumerate() {
            if rank < min_rank.0 {
                min_rank = (rank, j);
            }
        }
    }

    parts
}

fn byte_pair_encode(piece: &[u8], ranks: &Ranks) -> Result<Vec<Rank>, LoadError> {
    let lookup = |bytes: &[u8]| {
        ranks.get(bytes).copied().ok_or_else(|| {
            LoadError::Decode(format!("No rank for byte sequence {bytes:?}"))
        })
    };

    if piece.len() == 1 {
        return Ok(vec![lookup(piece)?]);
    }

    byte_pair_merge(ranks, piece)
        .windows(2)
        .map(|part| lookup(&piece[part[0].0..part[1].0]))
        .collect()
}
