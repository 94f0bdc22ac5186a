pub mod action;
pub mod config;
pub mod cookies;
pub mod counter;
pub mod document;
pub mod dom;
pub mod error;
pub mod handler;
pub mod interpreter;
pub mod io;
pub mod loader;
pub mod message;
pub mod paths;
pub mod schema;
pub mod session;

pub use error::{Result, UncookieError};
