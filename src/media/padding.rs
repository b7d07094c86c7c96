// SPDX-License-Identifier: MPL-2.0
//! Tile extraction with replicate-border padding.
//!
//! A tile rectangle may start at negative coordinates or run past the image.
//! Missing pixels take the value of the nearest edge pixel, so the executor
//! never sees an artificial black frame at image boundaries.

use ndarray::{s, Array3, ArrayView3, ArrayViewMut3};

use crate::domain::geometry::{Size, TileRect};
use crate::error::{Error, Result};

/// Extracts `rect` from a planar `C x H x W` image.
///
/// The result always has `rect`'s requested size.
///
/// # Errors
///
/// Returns [`Error::Precondition`] if the source image is empty.
pub fn extract(source: ArrayView3<'_, f32>, rect: TileRect) -> Result<Array3<f32>> {
    let mut tile = Array3::zeros((source.dim().0, rect.height, rect.width));
    extract_into(source, rect, tile.view_mut())?;
    Ok(tile)
}

/// Writes `rect` of `source` into `dst`, which must be `C x rect.height x rect.width`.
///
/// # Errors
///
/// Returns [`Error::Precondition`] if the source is empty or `dst` has the
/// wrong shape.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)] // offsets of a clipped rect
pub fn extract_into(
    source: ArrayView3<'_, f32>,
    rect: TileRect,
    mut dst: ArrayViewMut3<'_, f32>,
) -> Result<()> {
    let (channels, height, width) = source.dim();
    if height == 0 || width == 0 {
        return Err(Error::Precondition(
            "cannot extract a tile from an empty image".to_string(),
        ));
    }
    let expected = [channels, rect.height, rect.width];
    if dst.shape() != &expected[..] {
        return Err(Error::mismatch(
            "tile buffer shape",
            format!("{expected:?}"),
            format!("{:?}", dst.shape()),
        ));
    }

    let bounds = TileRect::from_size(Size::new(width, height));
    let Some(valid) = rect.intersect(&bounds) else {
        fill_nearest(source, rect, dst);
        return Ok(());
    };

    // valid region lands at (left, top) inside the tile
    let (left, top) = ((valid.x - rect.x) as usize, (valid.y - rect.y) as usize);
    let (right, bottom) = (left + valid.width, top + valid.height);
    let (vx, vy) = (valid.x as usize, valid.y as usize);
    dst.slice_mut(s![.., top..bottom, left..right])
        .assign(&source.slice(s![.., vy..vy + valid.height, vx..vx + valid.width]));

    if top > 0 {
        let edge = dst.slice(s![.., top..=top, left..right]).to_owned();
        dst.slice_mut(s![.., ..top, left..right]).assign(&edge);
    }
    if bottom < rect.height {
        let edge = dst.slice(s![.., bottom - 1..bottom, left..right]).to_owned();
        dst.slice_mut(s![.., bottom.., left..right]).assign(&edge);
    }
    // columns last so the corners repeat the corner pixels
    if left > 0 {
        let edge = dst.slice(s![.., .., left..=left]).to_owned();
        dst.slice_mut(s![.., .., ..left]).assign(&edge);
    }
    if right < rect.width {
        let edge = dst.slice(s![.., .., right - 1..right]).to_owned();
        dst.slice_mut(s![.., .., right..]).assign(&edge);
    }
    Ok(())
}

/// Samples the nearest image pixel for a rect that misses the image.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)] // clamped into the image
fn fill_nearest(source: ArrayView3<'_, f32>, rect: TileRect, mut dst: ArrayViewMut3<'_, f32>) {
    let (_, height, width) = source.dim();
    let columns = clamped_indices(rect.x, rect.width, width);
    let rows = clamped_indices(rect.y, rect.height, height);
    for (mut dst_plane, src_plane) in dst.outer_iter_mut().zip(source.outer_iter()) {
        for (dy, &sy) in rows.iter().enumerate() {
            for (dx, &sx) in columns.iter().enumerate() {
                dst_plane[[dy, dx]] = src_plane[[sy, sx]];
            }
        }
    }
}

/// Source index for each of `len` positions starting at `origin`, clamped
/// to `0..limit`.
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]
fn clamped_indices(origin: i64, len: usize, limit: usize) -> Vec<usize> {
    let last = limit as i64 - 1;
    (0..len as i64)
        .map(|offset| (origin + offset).clamp(0, last) as usize)
        .collect()
}
