//! API module which contains all the routes for the application.

pub mod admin;
pub mod auth;
pub mod cms;
pub mod route;
pub mod schema;
