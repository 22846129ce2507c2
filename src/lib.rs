//! Library exports for accountotron, shared between the binary and tests.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod platforms;
pub mod routes;
pub mod schema;
pub mod startup;
pub mod state;
pub mod token;
pub mod utils;
