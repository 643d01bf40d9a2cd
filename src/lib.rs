#![allow(clippy::too_many_arguments)]

//! MaskFE — raster mask editing engine.
//!
//! Paint, erase, flood-fill and draw straight lines on a binary mask that sits
//! over a background image, then export the mask as a black-and-white raster.
//! The UI layer owns widgets and events; it maps pointer positions through a
//! [`canvas::Viewport`] and drives a [`project::MaskProject`].

#[macro_use]
pub mod logger;
pub mod canvas;
pub mod components;
pub mod error;
pub mod io;
pub mod ops;
pub mod project;
pub mod settings;

pub use canvas::{PixelBuffer, Viewport};
pub use components::history::HistoryStack;
pub use components::tools::{CompositeMode, Tool};
pub use error::MaskError;
pub use project::MaskProject;
