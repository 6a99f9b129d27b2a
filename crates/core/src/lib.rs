#![forbid(unsafe_code)]

pub mod access;
pub mod catalog;
mod curriculum;
pub mod grading;
pub mod library;
pub mod model;
pub mod platform;
pub mod progression;
pub mod submission;
pub mod sync;
pub mod time;

pub use catalog::Catalog;
pub use time::Clock;
