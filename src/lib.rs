//! Inline images, vector graphics and structured values for terminals that
//! speak the DomTerm display protocol.
//!
//! - [`framer`] wraps markup in append/overwrite envelopes
//! - [`blob`] encodes figures into size-bounded inline images
//! - [`display`] owns the output stream and the figure lifecycle state
//! - [`figure`] adapts a plotting library to that lifecycle
//! - [`render`] and [`hook`] pretty-print evaluated values
//! - [`traceback`] turns panics into clickable, styled reports

pub mod blob;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod escape;
pub mod figure;
pub mod framer;
pub mod hook;
pub mod render;
pub mod traceback;
pub mod window;

pub use blob::{Blob, BlobSink, Encoded, ImageAttrs, ImageFormat};
pub use config::Config;
pub use display::{Display, DisplayState, FigureOptions};
pub use error::{DisplayError, Result};
pub use figure::{FigureAdapter, FileFigure, Figure, PlotBackend, PlotDefaults, ShowOptions};
pub use hook::DisplayHook;
pub use render::{render, Capability, KeyOrder, RenderContext, Value};
pub use window::{FigureSize, WindowSize};
