pub mod admin;
pub mod category;
pub mod home;
pub mod login;

pub use admin::{admin_page, AdminVm};
pub use category::{category_error_page, category_page, CategoryVm};
pub use home::home_page;
pub use login::login_page;
