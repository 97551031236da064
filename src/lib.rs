pub mod config;
pub mod constants;
pub mod engine;
pub mod grid;
pub mod observer;
pub mod policy;
pub mod rng;
pub mod scheduler;
pub mod types;
