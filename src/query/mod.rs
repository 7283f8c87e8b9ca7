//! Query construction and result reshaping: typed parameters in, Flux text
//! out, store tables back into tabular records.

mod error;
pub mod flux;
mod params;
pub mod rows;

pub use error::QueryError;
pub use params::{ReadingsRequest, ReadingsWindow};
