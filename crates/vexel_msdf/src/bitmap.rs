//! Float MSDF bitmap storage.

/// A width × height × 3 (R, G, B) float bitmap, row-major.
///
/// Created once per generation call and mutated in place by the generator,
/// the sign-correction pass and the error-correction pass, then converted to
/// 8-bit RGBA for the atlas texture.
#[derive(Debug, Clone)]
pub struct MsdfBitmap {
    pub width: usize,
    pub height: usize,
    /// `width * height * 3` values; channel-interleaved.
    pub data: Vec<f32>,
}

impl MsdfBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height * 3],
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let i = 3 * (y * self.width + x);
        &self.data[i..i + 3]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [f32] {
        let i = 3 * (y * self.width + x);
        &mut self.data[i..i + 3]
    }

    /// Median of the three channels at a texel: the scalar distance the
    /// field decodes to under `median(r, g, b)` sampling.
    #[inline]
    pub fn median_at(&self, x: usize, y: usize) -> f32 {
        let p = self.pixel(x, y);
        vexel_geometry::median(p[0] as f64, p[1] as f64, p[2] as f64) as f32
    }

    /// Quantize to RGBA8, clamping each channel to [0, 1] first.  Encoded
    /// values may legitimately exceed the unit interval far from the edge
    /// band; alpha is fixed opaque.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * 4);
        for texel in self.data.chunks_exact(3) {
            for &c in texel {
                out.push((c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8);
            }
            out.push(255);
        }
        out
    }
}
