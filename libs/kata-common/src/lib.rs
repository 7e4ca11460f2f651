pub mod config;
pub mod redis;
pub mod repository;
pub mod types;
