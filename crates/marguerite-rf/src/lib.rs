//! Random Forest classification capability: fit, predict, persist.
//!
//! Provides a seeded Random Forest classifier with CART decision trees and
//! Gini splits. Training is deterministic for a fixed seed, so a persisted
//! model reproduces the predictions of the freshly trained one.

mod config;
mod error;
mod forest;
mod serialize;
mod tree;

pub use config::ForestConfig;
pub use error::RfError;
pub use forest::Forest;
