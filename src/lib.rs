pub mod error;
pub mod types;

pub mod cache;
pub mod entity;
pub mod service;
pub mod table;
