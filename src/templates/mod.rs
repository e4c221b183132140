pub mod components;
pub mod layouts;
pub mod pages;

pub use components::{error_panel, property_grid};
pub use layouts::desktop::desktop_layout;
