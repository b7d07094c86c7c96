// SPDX-License-Identifier: MPL-2.0
//! Dihedral test-time augmentations and their exact inverses.
//!
//! Each [`AugmentationKind`] is described by a recipe: a forward sequence of
//! geometric [`Primitive`]s and the inverse sequence that undoes it. For the
//! composite kinds the inverse runs the inverted primitives in reverse order
//! (rotate back first, then flip), which is what makes
//! `inverse(forward(t, k), k) == t` hold pixel for pixel.
//!
//! Tiles are planar `C x H x W` arrays. Every primitive is a pure index
//! remapping built from ndarray view operations, so no value is ever
//! interpolated.

use ndarray::{s, Array3, ArrayView3, ArrayViewMut3};

use crate::error::{Error, Result};

// =============================================================================
// Primitive
// =============================================================================

/// Atomic geometric operation on a planar tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Mirror left to right.
    FlipHorizontal,
    /// Mirror top to bottom.
    FlipVertical,
    /// Rotate 90 degrees clockwise.
    Rotate90,
    /// Rotate 180 degrees.
    Rotate180,
    /// Rotate 270 degrees clockwise (90 counter-clockwise).
    Rotate270,
}

impl Primitive {
    /// Returns the primitive that undoes `self`.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Primitive::Rotate90 => Primitive::Rotate270,
            Primitive::Rotate270 => Primitive::Rotate90,
            other => other,
        }
    }

    /// Returns `true` if the primitive swaps the height and width axes.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Primitive::Rotate90 | Primitive::Rotate270)
    }

    /// Applies the primitive as a view remapping, without copying.
    fn apply_view(self, view: ArrayView3<'_, f32>) -> ArrayView3<'_, f32> {
        match self {
            Primitive::FlipHorizontal => view.slice_move(s![.., .., ..;-1]),
            Primitive::FlipVertical => view.slice_move(s![.., ..;-1, ..]),
            // transpose then mirror columns: new[r][c] = old[H-1-c][r]
            Primitive::Rotate90 => view.permuted_axes([0, 2, 1]).slice_move(s![.., .., ..;-1]),
            Primitive::Rotate180 => view.slice_move(s![.., ..;-1, ..;-1]),
            // transpose then mirror rows: new[r][c] = old[c][W-1-r]
            Primitive::Rotate270 => view.permuted_axes([0, 2, 1]).slice_move(s![.., ..;-1, ..]),
        }
    }
}

// =============================================================================
// AugmentationKind
// =============================================================================

/// One of the eight test-time augmentations, indexed `0..8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AugmentationKind {
    #[default]
    Identity,
    FlipHorizontal,
    FlipVertical,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontalRotate90,
    FlipVerticalRotate90,
}

/// Forward and inverse primitive sequences for one augmentation.
#[derive(Debug, Clone, Copy)]
struct Recipe {
    forward: &'static [Primitive],
    inverse: &'static [Primitive],
}

use Primitive::{FlipHorizontal as FH, FlipVertical as FV, Rotate180 as R180};
use Primitive::{Rotate270 as R270, Rotate90 as R90};

/// Indexed by [`AugmentationKind::index`].
const RECIPES: [Recipe; AugmentationKind::COUNT] = [
    Recipe { forward: &[], inverse: &[] },
    Recipe { forward: &[FH], inverse: &[FH] },
    Recipe { forward: &[FV], inverse: &[FV] },
    Recipe { forward: &[R90], inverse: &[R270] },
    Recipe { forward: &[R180], inverse: &[R180] },
    Recipe { forward: &[R270], inverse: &[R90] },
    Recipe { forward: &[FH, R90], inverse: &[R270, FH] },
    Recipe { forward: &[FV, R90], inverse: &[R270, FV] },
];

impl AugmentationKind {
    /// Number of augmentation kinds.
    pub const COUNT: usize = 8;

    /// All kinds in index order.
    pub const ALL: [AugmentationKind; Self::COUNT] = [
        AugmentationKind::Identity,
        AugmentationKind::FlipHorizontal,
        AugmentationKind::FlipVertical,
        AugmentationKind::Rotate90,
        AugmentationKind::Rotate180,
        AugmentationKind::Rotate270,
        AugmentationKind::FlipHorizontalRotate90,
        AugmentationKind::FlipVerticalRotate90,
    ];

    /// Returns the kind for `index`, or `None` if `index >= 8`.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Executor results per tile: every kind when `enabled`, identity only otherwise.
    #[must_use]
    pub const fn steps(enabled: bool) -> usize {
        if enabled {
            Self::COUNT
        } else {
            1
        }
    }

    /// Primitive sequence applied before inference.
    #[must_use]
    pub const fn forward_steps(self) -> &'static [Primitive] {
        RECIPES[self.index()].forward
    }

    /// Primitive sequence applied to the executor's output to undo [`forward_steps`].
    ///
    /// [`forward_steps`]: Self::forward_steps
    #[must_use]
    pub const fn inverse_steps(self) -> &'static [Primitive] {
        RECIPES[self.index()].inverse
    }

    /// Shape `(C, H, W)` of a tile of shape `shape` after `forward`.
    #[must_use]
    pub fn forward_shape(self, shape: [usize; 3]) -> [usize; 3] {
        transformed_shape(shape, self.forward_steps())
    }

    /// Applies the augmentation, returning a new tile in standard layout.
    #[must_use]
    pub fn forward(self, tile: ArrayView3<'_, f32>) -> Array3<f32> {
        materialize(tile, self.forward_steps())
    }

    /// Undoes [`forward`](Self::forward), returning a new tile in standard layout.
    #[must_use]
    pub fn inverse(self, tile: ArrayView3<'_, f32>) -> Array3<f32> {
        materialize(tile, self.inverse_steps())
    }

    /// Applies the augmentation into a preallocated destination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if `dst` does not have the augmented shape.
    pub fn forward_into(
        self,
        tile: ArrayView3<'_, f32>,
        dst: ArrayViewMut3<'_, f32>,
    ) -> Result<()> {
        assign_steps(tile, self.forward_steps(), dst)
    }

    /// Undoes the augmentation into a preallocated destination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if `dst` does not have the restored shape.
    pub fn inverse_into(
        self,
        tile: ArrayView3<'_, f32>,
        dst: ArrayViewMut3<'_, f32>,
    ) -> Result<()> {
        assign_steps(tile, self.inverse_steps(), dst)
    }
}

impl std::fmt::Display for AugmentationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AugmentationKind::Identity => "identity",
            AugmentationKind::FlipHorizontal => "flip-h",
            AugmentationKind::FlipVertical => "flip-v",
            AugmentationKind::Rotate90 => "rot90",
            AugmentationKind::Rotate180 => "rot180",
            AugmentationKind::Rotate270 => "rot270",
            AugmentationKind::FlipHorizontalRotate90 => "flip-h+rot90",
            AugmentationKind::FlipVerticalRotate90 => "flip-v+rot90",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn remap<'a>(tile: ArrayView3<'a, f32>, steps: &[Primitive]) -> ArrayView3<'a, f32> {
    steps.iter().fold(tile, |view, step| step.apply_view(view))
}

fn materialize(tile: ArrayView3<'_, f32>, steps: &[Primitive]) -> Array3<f32> {
    remap(tile, steps).as_standard_layout().into_owned()
}

fn transformed_shape(shape: [usize; 3], steps: &[Primitive]) -> [usize; 3] {
    let swaps = steps.iter().filter(|step| step.swaps_axes()).count();
    if swaps % 2 == 1 {
        [shape[0], shape[2], shape[1]]
    } else {
        shape
    }
}

fn assign_steps(
    tile: ArrayView3<'_, f32>,
    steps: &[Primitive],
    mut dst: ArrayViewMut3<'_, f32>,
) -> Result<()> {
    let view = remap(tile, steps);
    if view.shape() != dst.shape() {
        return Err(Error::mismatch(
            "augmented tile shape",
            format!("{:?}", dst.shape()),
            format!("{:?}", view.shape()),
        ));
    }
    dst.assign(&view);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// Tile whose every value is unique, so any misplaced pixel is detected.
    #[allow(clippy::cast_precision_loss)] // small test indices
    fn numbered_tile(channels: usize, height: usize, width: usize) -> Array3<f32> {
        Array3::from_shape_fn((channels, height, width), |(c, y, x)| {
            (c * 10_000 + y * 100 + x) as f32
        })
    }

    #[test]
    fn round_trip_is_exact_for_every_kind() {
        let tile = numbered_tile(3, 6, 6);
        for kind in AugmentationKind::ALL {
            let augmented = kind.forward(tile.view());
            let restored = kind.inverse(augmented.view());
            assert_eq!(restored, tile, "round trip failed for {kind}");
        }
    }

    #[test]
    fn round_trip_holds_for_rectangular_tiles() {
        let tile = numbered_tile(2, 3, 5);
        for kind in AugmentationKind::ALL {
            let augmented = kind.forward(tile.view());
            assert_eq!(augmented.shape(), &kind.forward_shape([2, 3, 5]));
            assert_eq!(kind.inverse(augmented.view()), tile, "{kind}");
        }
    }

    #[test]
    fn inverse_is_reversed_inverted_forward() {
        for kind in AugmentationKind::ALL {
            let expected: Vec<Primitive> = kind
                .forward_steps()
                .iter()
                .rev()
                .map(|step| step.inverse())
                .collect();
            assert_eq!(kind.inverse_steps(), expected.as_slice(), "{kind}");
        }
    }

    #[test]
    fn rotate90_is_not_self_inverse() {
        let tile = numbered_tile(1, 4, 4);
        let once = AugmentationKind::Rotate90.forward(tile.view());
        let twice = AugmentationKind::Rotate90.forward(once.view());
        assert_ne!(twice, tile);
        assert_eq!(AugmentationKind::Rotate90.inverse(once.view()), tile);
    }

    #[test]
    fn composite_inverse_order_matters() {
        let tile = numbered_tile(1, 4, 4);
        let kind = AugmentationKind::FlipHorizontalRotate90;
        let augmented = kind.forward(tile.view());

        // Running the forward order again (flip then rotate) does not restore.
        let wrong = remap(augmented.view(), &[FH, R270]).to_owned();
        assert_ne!(wrong, tile);
        assert_eq!(kind.inverse(augmented.view()), tile);
    }

    #[test]
    fn rotate90_turns_clockwise() {
        // 2x3 tile: row 0 = [0, 1, 2], row 1 = [100, 101, 102]
        let tile = numbered_tile(1, 2, 3);
        let rotated = AugmentationKind::Rotate90.forward(tile.view());
        assert_eq!(rotated.shape(), &[1, 3, 2]);
        // first row of the result is the first column read bottom to top
        assert_eq!(rotated[[0, 0, 0]], 100.0);
        assert_eq!(rotated[[0, 0, 1]], 0.0);
        assert_eq!(rotated[[0, 2, 1]], 2.0);
    }

    #[test]
    fn flips_mirror_the_right_axis() {
        let tile = numbered_tile(1, 2, 3);
        let h = AugmentationKind::FlipHorizontal.forward(tile.view());
        assert_eq!(h[[0, 0, 0]], 2.0);
        let v = AugmentationKind::FlipVertical.forward(tile.view());
        assert_eq!(v[[0, 0, 0]], 100.0);
    }

    #[test]
    fn forward_into_rejects_wrong_destination() {
        let tile = numbered_tile(3, 2, 4);
        let mut dst = Array3::<f32>::zeros((3, 2, 4));
        let result = AugmentationKind::Rotate90.forward_into(tile.view(), dst.view_mut());
        assert!(matches!(result, Err(Error::Precondition(_))));
    }

    #[test]
    fn forward_into_matches_forward() {
        let tile = numbered_tile(3, 5, 5);
        for kind in AugmentationKind::ALL {
            let mut dst = Array3::<f32>::zeros((3, 5, 5));
            kind.forward_into(tile.view(), dst.view_mut())
                .expect("square tile keeps its shape");
            assert_eq!(dst, kind.forward(tile.view()), "{kind}");
        }
    }

    #[test]
    fn index_round_trips() {
        for (i, kind) in AugmentationKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(AugmentationKind::from_index(i), Some(*kind));
        }
        assert_eq!(AugmentationKind::from_index(8), None);
    }
}
