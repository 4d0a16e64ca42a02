mod expense;
mod money;
mod summary;

pub use expense::*;
pub use money::*;
pub use summary::*;
