pub mod api;
pub mod dashboard;
pub mod health;
pub mod upload;
