mod inference;

pub use inference::*;
