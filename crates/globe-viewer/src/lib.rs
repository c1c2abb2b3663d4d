//! Interactive dotted-globe viewer.
//!
//! Renders the land masses of `globecore` as instanced point sprites around
//! a unit sphere, with storefront pins, halo sprites, and an egui label
//! overlay on top.

pub mod app;
pub mod camera;
pub mod data;
pub mod renderer;
pub mod ui;
