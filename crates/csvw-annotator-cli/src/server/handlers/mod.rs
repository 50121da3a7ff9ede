//! API request handlers.

mod annotate;
mod info;

pub use annotate::*;
pub use info::*;
