//! # `neuroforge` – The umbrella crate
//!
//! One import for the whole text workspace:
//!
//! | Crate                      | What it provides                                                         |
//! |----------------------------|--------------------------------------------------------------------------|
//! | **`neuroforge-core`**      | `InferenceEngine` trait, task/status types, analysis results, settings, log |
//! | **`neuroforge-session`**   | Model lifecycle, debounced analysis, generation guard, the `Session`     |
//! | **`neuroforge-hf`**        | Hugging Face Inference API engine *(optional, `hf` feature)*             |
//!
//! The `hf` feature is on by default. Turn it off to bring your own engine
//! without pulling in `reqwest` and TLS.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use neuroforge::{Task, hf::HfEngineBuilder, session::Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = HfEngineBuilder::new_from_env().build()?;
//!     let session = Session::builder(engine).build()?;
//!
//!     session.initialize().await;
//!     session.edit("The storm rolled in over the harbour");
//!     session.generate().await;
//!
//!     println!("{}", session.text());
//!     println!("{:?}", session.status(Task::Classifier));
//!     Ok(())
//! }
//! ```
#![doc(html_root_url = "https://docs.rs/neuroforge/latest")]

pub use neuroforge_core::*;
pub use neuroforge_session as session;

#[cfg(feature = "hf")]
pub use neuroforge_hf as hf;
