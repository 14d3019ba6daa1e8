//! Database model module. Each submodule owns its tables: it validates input, runs the SQL and shapes the rows for the API layer.

pub mod core;
pub mod util;
pub mod user;
pub mod catalog;
pub mod slide;
pub mod content;
pub mod team;
pub mod contact;
pub mod stats;
