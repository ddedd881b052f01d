//! Data models for the application

mod album;
mod attachment;
mod import;
mod order;
mod owner;

pub use album::*;
pub use attachment::*;
pub use import::*;
pub use order::*;
pub use owner::*;
