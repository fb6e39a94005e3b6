//! glitchcore: headless, seed-locked glitch-art renderer.
//!
//! Feeds a photograph through a fixed pipeline — subject detection,
//! wireframe mesh, chaotic text overlay, decorative boxes, depth of field,
//! CRT — with every random draw pulled from a generator pair seeded once
//! per session, so a (source, config, seed) triple always reproduces the
//! same bytes.

pub mod batch;
pub mod boxes;
pub mod canvas;
pub mod color;
pub mod config;
pub mod delaunay;
pub mod effects;
pub mod font;
pub mod geometry;
pub mod messages;
pub mod pixelfont;
pub mod renderer;
pub mod rng;
pub mod subject;
pub mod text;
pub mod wireframe;

pub use canvas::Canvas;
pub use color::Rgba;
pub use config::{GlitchConfig, Span};
pub use renderer::{render, RenderSession, RenderStats};
