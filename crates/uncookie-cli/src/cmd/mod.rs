pub mod check;
pub mod config;
pub mod counter;
pub mod fetch;
pub mod handler;
pub mod run;
