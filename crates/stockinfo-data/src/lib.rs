#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod period;
pub mod yahoo;

pub use error::{DataError, Result};
pub use period::Period;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
