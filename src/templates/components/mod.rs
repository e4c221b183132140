pub mod card;
pub mod error;

pub use card::{format_price, property_grid};
pub use error::error_panel;
