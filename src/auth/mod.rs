pub mod operator;
pub mod sessions;
pub mod token;
