pub mod channel;
pub mod repository;
pub mod sqlite;
