//! Windowed splitting with overlap.
//!
//! Each window ends at the last paragraph break it contains, else the last
//! line break, sentence end or space, and only cuts mid-word when the window
//! has no boundary at all. The next window starts `overlap` characters before
//! the previous cut, so chunks tile the document without dropping anything.

use crate::config::ChunkingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("overlap {overlap} must be smaller than chunk size {chunk_size}")]
    InvalidOverlap { chunk_size: usize, overlap: usize },
}

/// A contiguous piece of the document; offsets are character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

pub fn validate(cfg: &ChunkingConfig) -> Result<(), ChunkingError> {
    if cfg.chunk_size == 0 {
        return Err(ChunkingError::ZeroChunkSize);
    }
    if cfg.overlap >= cfg.chunk_size {
        return Err(ChunkingError::InvalidOverlap {
            chunk_size: cfg.chunk_size,
            overlap: cfg.overlap,
        });
    }
    Ok(())
}

pub fn split(text: &str, cfg: &ChunkingConfig) -> Result<Vec<Chunk>, ChunkingError> {
    validate(cfg)?;
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut chunks = Vec::new();
    if n == 0 {
        return Ok(chunks);
    }

    let separators: Vec<Vec<char>> = SEPARATORS.iter().map(|s| s.chars().collect()).collect();
    let mut start = 0;
    loop {
        if n - start <= cfg.chunk_size {
            chunks.push(make_chunk(&chars, chunks.len(), start, n));
            break;
        }
        let limit = start + cfg.chunk_size;
        // Cutting at or before start + overlap would not advance the window.
        let min_cut = start + cfg.overlap + 1;
        let cut = find_boundary(&chars, &separators, min_cut, limit).unwrap_or(limit);
        chunks.push(make_chunk(&chars, chunks.len(), start, cut));
        start = cut - cfg.overlap;
    }
    Ok(chunks)
}

fn make_chunk(chars: &[char], index: usize, start: usize, end: usize) -> Chunk {
    Chunk {
        index,
        start,
        end,
        text: chars[start..end].iter().collect(),
    }
}

/// Latest cut in `[min_cut, limit]` that falls right after a separator,
/// trying separators from coarsest to finest.
fn find_boundary(
    chars: &[char],
    separators: &[Vec<char>],
    min_cut: usize,
    limit: usize,
) -> Option<usize> {
    for sep in separators {
        let len = sep.len();
        let mut cut = limit;
        while cut >= min_cut && cut >= len {
            if chars[cut - len..cut] == sep[..] {
                return Some(cut);
            }
            cut -= 1;
        }
    }
    None
}
