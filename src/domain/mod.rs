pub mod flow;
pub mod zone;

pub use flow::*;
pub use zone::*;
