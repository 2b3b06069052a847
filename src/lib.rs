pub mod activity;
pub mod azdo;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod paginate;
pub mod util;
