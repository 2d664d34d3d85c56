mod cli;
mod ui;

pub use cli::*;
pub use ui::*;
