//! Adaptive PDF chunker.
//!
//! Text is extracted per page, then split recursively on paragraph, line,
//! and word boundaries. Chunk sizing adapts to document density: long
//! documents get half-size chunks so retrieval granularity stays useful.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("No extractable text in document")]
    Empty,
}

/// A text fragment of a PDF. Identifiers are attached by the pipeline
/// before upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfChunk {
    pub content: String,
    pub page_no: Option<u32>,
}

/// Configuration for the chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Baseline chunk size, characters as a token proxy.
    pub base_chunk_size: usize,
    /// Word-count-to-base ratio above which chunks are halved.
    pub density_threshold: f32,
    /// Overlap as a fraction of the chunk size.
    pub overlap_ratio: f32,
    pub min_overlap: usize,
    pub max_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            base_chunk_size: 900,
            density_threshold: 1.5,
            overlap_ratio: 0.2,
            min_overlap: 50,
            max_overlap: 200,
        }
    }
}

impl ChunkerConfig {
    /// Halve the chunk size for dense documents.
    pub fn adaptive_chunk_size(&self, total_words: usize) -> usize {
        if total_words as f32 / self.base_chunk_size as f32 > self.density_threshold {
            self.base_chunk_size / 2
        } else {
            self.base_chunk_size
        }
    }

    /// Overlap proportional to the chunk size, clamped to a usable range.
    pub fn overlap_for(&self, chunk_size: usize) -> usize {
        let raw = (chunk_size as f32 * self.overlap_ratio).round() as usize;
        raw.clamp(self.min_overlap, self.max_overlap)
    }
}

/// Parse a PDF byte stream into text chunks with page metadata.
/// Implemented by the lopdf parser in production and by a fixture
/// chunker in tests.
pub trait Chunker: Send + Sync {
    fn chunk(&self, pdf_bytes: &[u8]) -> Result<Vec<PdfChunk>, ChunkError>;
}

// ── lopdf implementation ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LopdfChunker {
    pub config: ChunkerConfig,
}

impl LopdfChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }
}

impl Chunker for LopdfChunker {
    fn chunk(&self, pdf_bytes: &[u8]) -> Result<Vec<PdfChunk>, ChunkError> {
        let doc = lopdf::Document::load_mem(pdf_bytes)?;
        let mut pages: Vec<(u32, String)> = Vec::new();
        for (page_no, _) in doc.get_pages() {
            match doc.extract_text(&[page_no]) {
                Ok(text) if !text.trim().is_empty() => pages.push((page_no, text)),
                // Pages without extractable text (scans, figures) are skipped.
                _ => continue,
            }
        }
        if pages.is_empty() {
            return Err(ChunkError::Empty);
        }

        let total_words: usize = pages.iter().map(|(_, t)| t.split_whitespace().count()).sum();
        let chunk_size = self.config.adaptive_chunk_size(total_words);
        let overlap = self.config.overlap_for(chunk_size);
        tracing::debug!(total_words, chunk_size, overlap, "Adaptive chunking parameters");

        let mut chunks = Vec::new();
        for (page_no, text) in &pages {
            for piece in split_text(text, chunk_size, overlap) {
                chunks.push(PdfChunk { content: piece, page_no: Some(*page_no) });
            }
        }
        if chunks.is_empty() {
            return Err(ChunkError::Empty);
        }
        Ok(chunks)
    }
}

// ── Recursive splitting ───────────────────────────────────────────────────────

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split `text` into pieces of at most `chunk_size` characters, preferring
/// paragraph over line over word boundaries, with `overlap` characters of
/// trailing context carried between consecutive pieces.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let parts = split_on_boundaries(text.trim(), chunk_size, &SEPARATORS);
    merge_parts(&parts, chunk_size, overlap)
}

fn split_on_boundaries(text: &str, chunk_size: usize, separators: &[&str]) -> Vec<String> {
    if text.chars().count() <= chunk_size {
        return if text.is_empty() { vec![] } else { vec![text.to_string()] };
    }
    let Some((sep, rest)) = separators.split_first() else {
        // No boundary left; hard-cut on character windows.
        let chars: Vec<char> = text.chars().collect();
        return chars.chunks(chunk_size).map(|w| w.iter().collect()).collect();
    };

    let mut out = Vec::new();
    for piece in text.split(sep) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if piece.chars().count() <= chunk_size {
            out.push(piece.to_string());
        } else {
            out.extend(split_on_boundaries(piece, chunk_size, rest));
        }
    }
    out
}

fn merge_parts(parts: &[String], chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for part in parts {
        let joined_len = if current.is_empty() {
            part.chars().count()
        } else {
            current.chars().count() + 1 + part.chars().count()
        };

        if joined_len > chunk_size && !current.is_empty() {
            let tail = overlap_tail(&current, overlap);
            chunks.push(std::mem::take(&mut current));
            current = tail;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(part);
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

/// Last `overlap` characters of a chunk, snapped forward to a word
/// boundary so the carried context never starts mid-word.
fn overlap_tail(chunk: &str, overlap: usize) -> String {
    let chars: Vec<char> = chunk.chars().collect();
    if overlap == 0 || chars.len() <= overlap {
        return String::new();
    }
    let tail: String = chars[chars.len() - overlap..].iter().collect();
    match tail.find(' ') {
        Some(idx) => tail[idx + 1..].to_string(),
        None => tail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_text("The capital of Atlantis is Orichalcum.", 900, 150);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "The capital of Atlantis is Orichalcum.");
    }

    #[test]
    fn long_text_splits_with_overlap() {
        let text = "word ".repeat(600);
        let chunks = split_text(&text, 200, 50);
        assert!(chunks.len() > 1, "600 words must not fit one 200-char chunk");
        for c in &chunks {
            assert!(c.chars().count() <= 260, "chunk too large: {}", c.len());
        }
        // Consecutive chunks share carried context.
        let first_tail: Vec<&str> = chunks[0].split_whitespace().rev().take(3).collect();
        assert!(first_tail.iter().all(|w| chunks[1].contains(w)));
    }

    #[test]
    fn paragraph_boundaries_are_preferred() {
        let text = format!("{}\n\n{}", "alpha ".repeat(30).trim(), "beta ".repeat(30).trim());
        let chunks = split_text(&text, 200, 0);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("alpha"));
        assert!(chunks[1].starts_with("beta"));
    }

    #[test]
    fn dense_documents_get_half_size_chunks() {
        let cfg = ChunkerConfig::default();
        assert_eq!(cfg.adaptive_chunk_size(1000), 900);
        assert_eq!(cfg.adaptive_chunk_size(2000), 450);
    }

    #[test]
    fn overlap_is_clamped() {
        let cfg = ChunkerConfig::default();
        assert_eq!(cfg.overlap_for(900), 180);
        assert_eq!(cfg.overlap_for(100), 50);
        assert_eq!(cfg.overlap_for(4000), 200);
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let chunker = LopdfChunker::default();
        assert!(chunker.chunk(b"not a pdf").is_err());
    }
}
