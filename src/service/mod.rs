//! Paginated reads over the database handle.

mod paginator;
pub use paginator::Paginator;
