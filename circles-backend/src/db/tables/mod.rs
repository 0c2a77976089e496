//! Database table operations
//!
//! Each file adds an impl block to `Database` for one table.

pub mod chat_list;
pub mod circles_settings;
pub mod preferences;
