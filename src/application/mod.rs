//! Application services layer.

pub mod articles;
pub mod blocks;
pub mod error;
pub mod ports;
pub mod publish;
pub mod rehome;
pub mod repos;
pub mod transform;

pub use error::AppError;
