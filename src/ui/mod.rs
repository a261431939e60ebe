//! Web UI pages

mod handlers;
mod pages;

pub use handlers::*;
pub use pages::Pages;
