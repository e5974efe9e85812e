pub mod fetch;

pub use fetch::{HttpSessionFetcher, SessionFetcher};
