//! Centralized error handling for the capture/timeline/slice subsystem.
//!
//! # Usage
//!
//! ```rust
//! use mediawatch::errors::{CoreError, CoreResult};
//!
//! fn example() -> CoreResult<String> {
//!     Ok("ok".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for Results using [`ExtractError`].
pub type ExtractResult<T> = Result<T, ExtractError>;
