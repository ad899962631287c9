pub mod api;
pub mod app;
pub mod chart;
pub mod config;
pub mod error;
pub mod section;
pub mod services;
pub mod workbook;
