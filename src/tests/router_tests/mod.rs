mod admin_tests;
mod auth_flow_tests;
mod category_page_tests;
mod properties_api_tests;
mod publish_tests;
