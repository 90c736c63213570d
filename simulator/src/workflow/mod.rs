pub mod benchmark;
pub mod config;
pub mod runner;
