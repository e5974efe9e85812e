pub mod coordinator;
pub mod error;
pub mod pool;
pub mod retrying;

pub use coordinator::GenerationCoordinator;
pub use error::GenerateError;
