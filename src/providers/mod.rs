pub mod manager;
pub mod traits;
pub mod types;

pub use manager::{SourceChain, SourceHit, SourceOp};
pub use traits::{SongSource, SourceError};
pub use types::SourceId;
