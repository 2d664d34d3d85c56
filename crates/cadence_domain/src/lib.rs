mod analysis;
mod descriptor;
mod model;
mod request;
mod service;
mod turn;

pub use analysis::*;
pub use descriptor::*;
pub use model::*;
pub use request::*;
pub use service::*;
pub use turn::*;
