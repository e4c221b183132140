pub mod category;
pub mod dashboard;
pub mod filter;
pub mod normalize;
pub mod property;
