pub mod config;
pub mod error;
pub mod io;
pub mod pain_point;
pub mod paths;
pub mod query;
pub mod row;
pub mod sink;

pub use error::{GrowthError, Result, SinkError};
