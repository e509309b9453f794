//! Storage layer for rootgate: task records, the execution bitmap and the
//! compact fee encoding.

pub mod bitmap;
pub mod compact;
pub mod models;
pub mod store;

pub use bitmap::{BitmapError, ExecutedBitmap};
pub use compact::{CompactError, CompressedAmount};
pub use models::{Address, Hash, HexParseError, TaskRecord, TaskStatus};
pub use store::{MemoryTaskStore, StoreError, TaskStore};
