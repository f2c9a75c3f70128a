//! curricle-core — Core course engine, model, and scoring.
//!
//! This crate defines the curriculum model, the eligibility and progress
//! rules, the exam scorer, and the engine that ties them to a store.

pub mod curriculum;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod progress;
pub mod report;
pub mod roster;
pub mod scoring;
pub mod traits;
