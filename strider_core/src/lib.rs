// strider_core/src/lib.rs

// This file defines the public modules of the library.
pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod history;
pub mod host;
pub mod kinematics;
pub mod math;
pub mod prediction;
pub mod prelude;
pub mod sample;
