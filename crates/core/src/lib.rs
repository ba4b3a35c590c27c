#![forbid(unsafe_code)]

pub mod compatibility;
pub mod error;
pub mod model;
pub mod scoring;
pub mod share_link;
pub mod time;

pub use error::Error;
pub use time::Clock;
