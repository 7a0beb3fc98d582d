//! Reference corpus: chunking, embedding index and per-session caching.

pub mod chunking;
pub mod index;
pub mod library;

pub use chunking::{CHUNK_OVERLAP, CHUNK_SIZE, TextSplitter};
pub use index::{Chunk, IndexError, ReferenceIndex, ScoredChunk};
pub use library::ReferenceLibrary;
