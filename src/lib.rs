pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod medium;
pub mod output;
pub mod probe;
pub mod result;
pub mod settings;
pub mod simulation;
pub mod source;
pub mod spectrum;
