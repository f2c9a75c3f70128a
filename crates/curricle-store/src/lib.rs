//! curricle-store — Progress and submission stores.
//!
//! Implements the `CourseStore` trait over an in-memory map and a REST
//! backend, so the same engine runs against a local simulation or a live
//! course database.

pub mod config;
pub mod memory;
pub mod rest;

pub use config::{create_store, load_config, CurricleConfig, StoreConfig};
pub use memory::MemoryStore;
pub use rest::RestStore;
