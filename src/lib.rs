pub mod decipher;
pub mod download;
mod error;
pub mod extractor;
pub mod format;
pub mod manifest;
pub mod page;
pub mod session;
mod util;

pub use error::{Error, Result};
