//! API route handlers

pub mod health;
pub mod indexing_status;
