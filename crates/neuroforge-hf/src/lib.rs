//! [`neuroforge_core::InferenceEngine`] backed by the hosted Hugging Face
//! Inference API.
//!
//! ```rust,no_run
//! use neuroforge_hf::HfEngineBuilder;
//!
//! let engine = HfEngineBuilder::new_from_env()
//!     .build()
//!     .expect("HF_API_TOKEN must be set");
//! ```
mod adapter;
pub mod api;
mod client;
pub mod error;

pub use adapter::{HfEngine, HfEngineBuilder, LoadPolicy};
pub use client::HfClient;
