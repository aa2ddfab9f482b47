//! CPU-side atlas page building.
//!
//! Glues the rectangle packer to the MSDF pipeline: each shape gets a slot
//! on the RGBA8 page, a distance field generated into it (sign- and
//! error-corrected), and UV coordinates for sampling.  Uploading the page
//! to a GPU texture is the caller's concern.

use glam::DVec2;
use thiserror::Error;
use vexel_geometry::Shape;
use vexel_msdf::{correct_errors, correct_signs, generate_msdf, MsdfConfig};

use crate::packer::{PackHeuristic, Rect, RectPacker};
use crate::raster::{fill_shape, PixelBuffer};

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("no room in {page_width}x{page_height} atlas for a {width}x{height} slot")]
    OutOfSpace {
        width: u32,
        height: u32,
        page_width: u32,
        page_height: u32,
    },
    #[error("slot dimensions must be non-zero")]
    EmptySlot,
}

/// A placed atlas region with its normalized sampling coordinates
/// (`[u0, v0, u1, v1]`).
#[derive(Debug, Clone, Copy)]
pub struct AtlasSlot {
    pub rect: Rect,
    pub uv: [f32; 4],
}

pub struct AtlasBuilder {
    packer: RectPacker,
    page: PixelBuffer,
}

impl AtlasBuilder {
    pub fn new(width: usize, height: usize) -> Self {
        let mut packer = RectPacker::new(width as i32, height as i32);
        // Slots carry oriented bitmaps; rotating them would scramble UVs.
        packer.allow_rotation = false;
        Self {
            packer,
            page: PixelBuffer::new(width, height),
        }
    }

    pub fn page(&self) -> &PixelBuffer {
        &self.page
    }

    pub fn into_page(self) -> PixelBuffer {
        self.page
    }

    fn pack(&mut self, width: usize, height: usize) -> Result<Rect, AtlasError> {
        if width == 0 || height == 0 {
            return Err(AtlasError::EmptySlot);
        }
        let placed = self
            .packer
            .insert(width as i32, height as i32, PackHeuristic::BestShortSideFit)
            .ok_or(AtlasError::OutOfSpace {
                width: width as u32,
                height: height as u32,
                page_width: self.page.width as u32,
                page_height: self.page.height as u32,
            })?;
        Ok(placed.rect)
    }

    fn slot_uv(&self, rect: Rect) -> [f32; 4] {
        let (w, h) = (self.page.width as f32, self.page.height as f32);
        [
            rect.x as f32 / w,
            rect.y as f32 / h,
            (rect.x + rect.width) as f32 / w,
            (rect.y + rect.height) as f32 / h,
        ]
    }

    /// Generate a corrected MSDF for `shape` into a fresh slot.
    pub fn add_msdf(
        &mut self,
        shape: &Shape,
        config: &MsdfConfig,
        width: usize,
        height: usize,
    ) -> Result<AtlasSlot, AtlasError> {
        let rect = self.pack(width, height)?;
        log::debug!(
            "msdf slot {}x{} at ({}, {})",
            width,
            height,
            rect.x,
            rect.y
        );

        let mut bitmap = generate_msdf(shape, config, width, height);
        correct_signs(&mut bitmap, shape, config);
        correct_errors(&mut bitmap, shape, config);
        let rgba = bitmap.to_rgba8();

        let page_width = self.page.width;
        for row in 0..height {
            let dst = 4 * ((rect.y as usize + row) * page_width + rect.x as usize);
            let src = 4 * row * width;
            self.page.data[dst..dst + 4 * width].copy_from_slice(&rgba[src..src + 4 * width]);
        }
        Ok(AtlasSlot {
            rect,
            uv: self.slot_uv(rect),
        })
    }

    /// Rasterize `shape` flat-colored into a fresh slot (the non-SDF sprite
    /// preview path).  Shape coordinates are relative to the slot origin.
    pub fn add_flat(
        &mut self,
        shape: &Shape,
        color: [u8; 4],
        width: usize,
        height: usize,
    ) -> Result<AtlasSlot, AtlasError> {
        let rect = self.pack(width, height)?;
        log::debug!(
            "flat slot {}x{} at ({}, {})",
            width,
            height,
            rect.x,
            rect.y
        );
        let offset = DVec2::new(rect.x as f64, rect.y as f64);
        let mut positioned = shape.clone();
        for contour in &mut positioned.contours {
            for edge in &mut contour.edges {
                edge.segment = edge.segment.translated(offset);
            }
        }
        fill_shape(&mut self.page, rect, &positioned, color);
        Ok(AtlasSlot {
            rect,
            uv: self.slot_uv(rect),
        })
    }
}
