//! Transform implementations for ticker records

mod row_projector;

pub use row_projector::RowProjector;
