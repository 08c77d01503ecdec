pub mod error;
pub mod status;
pub mod types;

pub use error::DialogueError;
pub use status::*;
pub use types::*;
