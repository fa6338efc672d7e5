//! Utility functions for common operations.
//!
//! - **Debouncing**: holding back keystroke-rate input until it settles
//! - **Text processing**: Unicode-aware truncation, control-char stripping, excerpts
//! - **URL validation**: checking configured API base URLs

mod base_url;
mod debounce;
mod text;

pub use base_url::{validate_base_url, BaseUrlError};
pub use debounce::Debouncer;
pub use text::{excerpt, strip_control_chars, truncate_to_width};
