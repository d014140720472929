//! Chunk types for the document index.

use serde::{Deserialize, Serialize};

/// Provenance of an indexed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Document section the chunk was taken from (e.g., "Warnings").
    pub section: String,
    /// Source file the chunk was extracted from.
    pub file: String,
}

impl ChunkMetadata {
    /// Create new chunk metadata.
    pub fn new(section: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            file: file.into(),
        }
    }
}

/// A chunk of document text with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocChunk {
    /// The chunk text.
    pub content: String,
    /// Where the chunk came from.
    pub metadata: ChunkMetadata,
}

impl DocChunk {
    /// Create a new chunk.
    pub fn new(
        content: impl Into<String>,
        section: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata: ChunkMetadata::new(section, file),
        }
    }
}

/// A chunk scored by its distance from a query embedding.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched chunk.
    pub chunk: DocChunk,
    /// Distance from the query vector (lower = more similar).
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_construction() {
        let chunk = DocChunk::new("Take with food.", "Dosage", "ibuprofen.txt");
        assert_eq!(chunk.content, "Take with food.");
        assert_eq!(chunk.metadata.section, "Dosage");
        assert_eq!(chunk.metadata.file, "ibuprofen.txt");
    }

    #[test]
    fn test_metadata_roundtrips_through_json() {
        let metadata = ChunkMetadata::new("Warnings", "aspirin.txt");
        let json = serde_json::to_string(&metadata).unwrap();
        let back: ChunkMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
