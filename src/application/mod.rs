// Application layer - ledger use cases on top of storage and domain.
// The CLI talks only to `ExpenseService`.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
