//! Fixture chunker: treats the uploaded bytes as UTF-8 text and splits
//! on blank lines, one page per paragraph. Lets tests drive the pipeline
//! without real PDF bytes.

use cerebra_ingestion::{ChunkError, Chunker, PdfChunk};

#[derive(Default)]
pub struct StaticChunker;

impl StaticChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Chunker for StaticChunker {
    fn chunk(&self, pdf_bytes: &[u8]) -> Result<Vec<PdfChunk>, ChunkError> {
        let text = std::str::from_utf8(pdf_bytes).map_err(|_| ChunkError::Empty)?;
        let chunks: Vec<PdfChunk> = text
            .split("\n\n")
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(i, p)| PdfChunk { content: p.to_string(), page_no: Some(i as u32 + 1) })
            .collect();
        if chunks.is_empty() {
            return Err(ChunkError::Empty);
        }
        Ok(chunks)
    }
}
