pub mod token;
pub mod token_cache;

pub use token::Credentials;
pub use token_cache::{CacheStatus, TokenCache};
