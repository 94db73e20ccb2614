// src/lib.rs
//! Location-based job discovery: nearby job listings, driving routes to a
//! job, and radius-bounded recommendations ranked by a matching service.

pub mod core;
pub mod discovery;
pub mod environment;
pub mod geo;
pub mod job_cli;
pub mod location;
pub mod recommend;
pub mod routing;
pub mod state;
pub mod types;
pub mod utils;
pub mod web;

pub use environment::EnvironmentConfig;
pub use web::start_web_server;
