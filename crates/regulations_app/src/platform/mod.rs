mod app;
mod config;
mod effects;
mod persist;
mod ui;

pub use app::run_app;
