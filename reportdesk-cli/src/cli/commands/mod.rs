//! Command handlers

pub mod columns;
pub mod export;
pub mod generate;
pub mod map;
pub mod store;
