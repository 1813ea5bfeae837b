//! Integration tests for the progression engine.


mod cache;
mod completion;
mod notifications;
mod quiz;
mod rollback;
mod scenario;
mod unlock;

#[cfg(feature = "http")]
mod http;
