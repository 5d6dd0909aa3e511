// Middleware modules
pub mod auth;
pub mod logging;
