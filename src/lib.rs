//! Mockforge: AI Product Mockup Generation
//!
//! Turns one product photo into a batch of photorealistic scene mockups by
//! compositing the product into preset or custom scenes through an external
//! image-generation model.

pub mod batch;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod prompt;
pub mod provider;
pub mod queue;
pub mod scene;
pub mod store;
