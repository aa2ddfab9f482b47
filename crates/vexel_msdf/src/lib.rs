//! Multi-channel signed distance field (MSDF) generation.
//!
//! An MSDF encodes a shape's signed distance into three color channels such
//! that `median(r, g, b)` reconstructs sharp corners under bilinear
//! sampling, where a single-channel field would round them off.  The
//! pipeline is:
//!
//! 1. [`generate_msdf`]: per-texel channel distances via per-contour
//!    selectors, combined with overlap/nesting awareness,
//! 2. [`correct_signs`]: exact scanline fill test overrules texels whose
//!    median landed on the wrong side,
//! 3. [`correct_errors`]: interpolation artifacts between texels are found
//!    and flattened to the median.
//!
//! Distances are encoded as `d / range + 0.5`: inside is above 0.5, outside
//! below.  Contours wound counter-clockwise enclose filled area.

pub mod bitmap;
pub mod combiner;
pub mod error_correction;
pub mod generate;
pub mod scanline;
pub mod selector;
pub mod sign_correction;

pub use bitmap::MsdfBitmap;
pub use error_correction::{correct_errors, ErrorCorrection};
pub use generate::{generate_msdf, generate_msdf_simple, MsdfConfig};
pub use scanline::Scanline;
pub use sign_correction::correct_signs;
