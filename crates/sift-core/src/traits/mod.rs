mod chunk_storage;
mod pattern_storage;

pub use chunk_storage::IChunkStorage;
pub use pattern_storage::IPatternStorage;
