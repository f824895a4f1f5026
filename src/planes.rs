//! Contains the PlaneMapper struct, which describes the relationship
//! between the real plane the attractor lives on and the integral
//! plane of the image, with an origin at 0,0 in the upper left.
//!
//! The attractor's interesting region spans roughly -2.5..2.5 in x,
//! so at zoom 1 that span fills the width of the image and the origin
//! of the real plane sits in the middle of it.
use num::Complex;

/// The half-width, in attractor units, that zoom 1 fits into half the
/// image width.
const VIEW_RADIUS: f64 = 2.5;

/// Describes the x, y of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

// We don't need a Point, as a single Complex number is a Point.

/// Maps points on the real plane, translated by the view offset and
/// scaled by the zoom, to pixels.  Uniform scale: a pixel is square
/// in attractor space whatever the aspect of the image.
#[derive(Debug)]
pub struct PlaneMapper {
    width: usize,
    height: usize,
    // Pixel coordinates of the real plane's origin.
    center: (f64, f64),
    scale: f64,
    offset: Complex<f64>,
}

impl PlaneMapper {
    /// Constructor.  Takes the integral plane's dimensions, the zoom,
    /// and the offset added to every point before it is scaled.
    pub fn new(width: usize, height: usize, zoom: f64, offset: Complex<f64>) -> PlaneMapper {
        let center = (width as f64 / 2.0, height as f64 / 2.0);
        PlaneMapper {
            width,
            height,
            center,
            scale: center.0 / VIEW_RADIUS * zoom,
            offset,
        }
    }

    /// Given a point on the real plane, find the pixel it falls in,
    /// or nothing if it lands outside the image.  Coordinates are
    /// floored, so a point just left of a pixel edge belongs to the
    /// pixel on the left.
    #[inline]
    pub fn point_to_pixel(&self, point: Complex<f64>) -> Option<Pixel> {
        let left = ((point.re + self.offset.re) * self.scale + self.center.0).floor();
        let top = ((point.im + self.offset.im) * self.scale + self.center.1).floor();
        if left < 0.0 || top < 0.0 || left >= self.width as f64 || top >= self.height as f64 {
            return None;
        }
        Some(Pixel(left as usize, top as usize))
    }

    /// The linear offset of a point's pixel from the root of a
    /// row-major buffer.
    #[inline]
    pub fn point_to_offset(&self, point: Complex<f64>) -> Option<usize> {
        self.point_to_pixel(point)
            .map(|Pixel(left, top)| top * self.width + left)
    }
}
