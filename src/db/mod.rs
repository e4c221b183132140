pub mod connection;
pub mod kv;
pub mod records;
