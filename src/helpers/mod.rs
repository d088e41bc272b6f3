//! Helper functions shared by the generator and templates

pub mod date;
pub mod html;
pub mod toc;
pub mod url;

pub use date::*;
pub use html::*;
pub use toc::*;
pub use url::*;
