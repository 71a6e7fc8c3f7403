pub mod retry;

pub use retry::{retry_on_transient, IsTransient, RetryConfig, RetryError};
