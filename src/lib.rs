//! Common functionality for the two-region energy scenario toolkit.
#![warn(missing_docs)]
pub mod cli;
pub mod costs;
pub mod dispatch;
pub mod emissions;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod profiles;
pub mod region;
pub mod scenario;
pub mod settings;
pub mod solver;
pub mod technology;

#[cfg(test)]
mod fixture;
