//! Atlas construction for the Vexel MSDF pipeline.
//!
//! Brings together the MaxRects rectangle packer, the flat-color scanline
//! rasterizer, the glyph/sprite shape bridges, and the [`AtlasBuilder`]
//! that generates corrected distance fields into packed RGBA8 page slots.

pub mod atlas;
pub mod glyph;
pub mod packer;
pub mod raster;
pub mod sprite;

pub use atlas::{AtlasBuilder, AtlasError, AtlasSlot};
pub use glyph::{shape_from_outline, OutlinePoint, PointTag};
pub use packer::{PackHeuristic, PackedRect, Rect, RectPacker};
pub use raster::{fill_shape, PixelBuffer};
pub use sprite::{shape_from_anchors, Anchor};
