pub mod pool;
pub mod source_id;
pub mod synthetic;

pub use pool::{Pool, Side};
pub use source_id::SourceId;
pub use synthetic::SyntheticPool;
