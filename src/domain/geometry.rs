// SPDX-License-Identifier: MPL-2.0
//! Pixel-space geometry value types.
//!
//! Rectangles here are *requested* regions: a [`TileRect`] may start at a
//! negative coordinate or extend past the image it refers to. Clipping is
//! the caller's job (see [`TileRect::intersect`]).

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[must_use]
    pub const fn area(self) -> usize {
        self.width * self.height
    }

    /// Returns `true` if width and height are equal.
    #[must_use]
    pub const fn is_square(self) -> bool {
        self.width == self.height
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileRect {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

impl TileRect {
    #[must_use]
    pub const fn new(x: i64, y: i64, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle anchored at the origin covering `size`.
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Exclusive right edge.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // tile dimensions are far below i64::MAX
    pub const fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    /// Exclusive bottom edge.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    #[must_use]
    pub const fn contains(&self, other: &TileRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the overlapping region of two rectangles, or `None` if they
    /// do not overlap.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)] // max > min checked
    pub fn intersect(&self, other: &TileRect) -> Option<TileRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(TileRect::new(x0, y0, (x1 - x0) as usize, (y1 - y0) as usize))
    }
}

/// Input and output rectangle for one tile index.
///
/// `input` always has the executor's fixed input size. `output` is clipped
/// to the canvas at the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    pub input: TileRect,
    pub output: TileRect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_and_bottom_are_exclusive() {
        let rect = TileRect::new(-4, 2, 10, 6);
        assert_eq!(rect.right(), 6);
        assert_eq!(rect.bottom(), 8);
    }

    #[test]
    fn intersect_clips_negative_origin() {
        let image = TileRect::from_size(Size::new(32, 32));
        let rect = TileRect::new(-8, -4, 16, 16);
        assert_eq!(rect.intersect(&image), Some(TileRect::new(0, 0, 8, 12)));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = TileRect::new(0, 0, 4, 4);
        let b = TileRect::new(4, 0, 4, 4);
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn contains_detects_overhang() {
        let image = TileRect::from_size(Size::new(10, 10));
        assert!(image.contains(&TileRect::new(2, 2, 8, 8)));
        assert!(!image.contains(&TileRect::new(2, 2, 9, 8)));
    }

    #[test]
    fn size_display_and_shape() {
        let size = Size::new(256, 128);
        assert_eq!(size.to_string(), "256x128");
        assert!(!size.is_square());
        assert!(Size::new(0, 4).is_empty());
    }
}
