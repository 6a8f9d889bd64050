//! reportdesk: branch sales reporting toolkit
//!
//! Column auto-mapping for uploaded spreadsheets, a typed client for the
//! report backend, a consolidated report store and export to Excel/CSV.

pub mod api;
pub mod cli;
pub mod config;
pub mod export;
pub mod report;
pub mod services;
pub mod sheets;
pub mod store;
