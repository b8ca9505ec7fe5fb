pub mod automaton;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod geometry;
pub mod optimizer;
pub mod tsp;
