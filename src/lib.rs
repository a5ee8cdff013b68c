//! Annotated, narrative-driven multi-series line chart core.
//!
//! ```text
//! CSV ──► data (Series, DateAxis) ──► filter ──► render::Renderer
//!                    │                                ▲
//!                    └──► annotation ◄── session ─────┘
//!                                           ▲
//!                              narrative steps, pointer, toggles
//! ```
//!
//! Rendering primitives (element lifecycle, axes) live behind
//! [`render::Renderer`]; everything here is data binding.

pub mod annotation;
pub mod config;
pub mod data;
pub mod dimension;
pub mod error;
pub mod filter;
pub mod format;
pub mod locator;
pub mod logging;
pub mod narrative;
pub mod path;
pub mod render;
pub mod scale;
pub mod session;

pub use error::{ChartError, Result};
