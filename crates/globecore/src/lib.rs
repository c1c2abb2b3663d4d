//! Core logic for the storefront globe: land topology decoding, sphere
//! sampling, result caches, and the setup/lifecycle state machines.
//!
//! Everything here is plain data plus worker threads. Windowing, GPU work,
//! and text layout live in the viewer crate, which keeps this one testable
//! without a device.

pub mod cache;
pub mod config;
pub mod error;
pub mod frame;
pub mod geo;
pub mod pins;
pub mod sample;
pub mod scheduler;
pub mod setup;
pub mod source;
pub mod topology;

pub use cache::{GlobeCaches, SamplePair};
pub use config::GlobeConfig;
pub use error::{ConfigError, LandError};
pub use frame::{GlobePhase, LoopController, Tick, FRAME_INTERVAL};
pub use pins::{Pin, PinScene};
pub use setup::{SetupEvent, SetupPipeline, Stage};
pub use source::{LandGeometry, LandSource};
