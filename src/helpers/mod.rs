pub mod config;
pub mod excel;
