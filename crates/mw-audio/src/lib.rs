// Audio decoding and silence / modulation classification for modwatch.

pub mod classifier;
pub mod decode;
pub mod error;
pub mod signal;

pub use classifier::{ChunkLevel, chunk_levels, classify, classify_file};
pub use error::AudioError;
pub use signal::{AudioSignal, Chunk};
