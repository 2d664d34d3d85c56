mod client;
mod config;
mod dto;
mod error;

pub use client::*;
pub use config::*;
pub use error::*;
