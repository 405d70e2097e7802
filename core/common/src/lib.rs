//! Common types shared across DriveBridge modules.

pub mod error;

pub use error::{Error, Result};
