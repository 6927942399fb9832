pub mod config;
pub mod detect;
pub mod languages;
