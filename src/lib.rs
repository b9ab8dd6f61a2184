pub mod args;
pub mod calculator;
pub mod commands;
mod config;
mod error;
pub mod loader;
pub mod model;
pub mod output;
pub mod render;
mod utils;
pub mod workbook;


pub use config::Config;
pub use error::{Error, ErrorType, Result};
pub use workbook::Mode;
