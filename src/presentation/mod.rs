// Presentation layer - HTTP surface for the dashboard page
pub mod app_state;
pub mod handlers;
