pub mod bank;
pub mod gateway;
pub mod records;
pub mod repository;
pub mod sqlite;
