mod backup;
mod store;

pub use backup::*;
pub use store::*;
