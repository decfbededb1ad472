pub mod config;
pub mod diagnostics;
pub mod error;
pub mod force;
pub mod initial;
pub mod shared;
pub mod simulation;
pub mod vis;
