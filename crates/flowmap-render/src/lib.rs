//! Map rendering layer for flowmap.
//!
//! Projects state boundaries onto a stereographic basemap, colours regions
//! by observation count and draws flow arrows, writing one image per frame
//! through [`plotters`].

pub mod arrows;
pub mod boundaries;
pub mod colormap;
pub mod map;
pub mod projection;
pub mod style;

pub use flowmap_core as core;
