// SPDX-License-Identifier: MPL-2.0
//! Conversion between images and normalized planar buffers.
//!
//! Executors consume `C x H x W` planes with values in `[0, 1]`. The plane
//! order follows [`ChannelOrder`]. 8-bit RGB images convert directly; other
//! encodings go through 32-bit float RGB and are restored afterwards with
//! [`convert_to`].

use image_rs::{ColorType, DynamicImage, Rgb, Rgb32FImage, RgbImage};
use ndarray::{Array3, ArrayView3};

use crate::config::ChannelOrder;
use crate::error::{Error, Result};

/// Source channel of each plane, per order.
const fn plane_channels(order: ChannelOrder) -> [usize; 3] {
    match order {
        ChannelOrder::Rgb => [0, 1, 2],
        ChannelOrder::Bgr => [2, 1, 0],
    }
}

/// Converts an RGB image to normalized `3 x H x W` planes in `order`.
#[must_use]
pub fn image_to_planes(image: &RgbImage, order: ChannelOrder) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut planes = Array3::<f32>::zeros((3, height as usize, width as usize));
    let channels = plane_channels(order);

    for (x, y, pixel) in image.enumerate_pixels() {
        for (plane, &channel) in channels.iter().enumerate() {
            // u8 to f32 is lossless via From
            planes[[plane, y as usize, x as usize]] = f32::from(pixel.0[channel]) / 255.0;
        }
    }
    planes
}

/// Converts normalized planes in `order` back to an RGB image.
///
/// Values are scaled by 255, clamped and rounded.
///
/// # Errors
///
/// Returns [`Error::Precondition`] if `planes` does not have three channels
/// or is too large for an image.
pub fn planes_to_image(planes: ArrayView3<'_, f32>, order: ChannelOrder) -> Result<RgbImage> {
    let (width, height) = image_dimensions(planes)?;
    let channels = plane_channels(order);
    Ok(RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let mut rgb = [0u8; 3];
        for (plane, &channel) in channels.iter().enumerate() {
            rgb[channel] = to_u8(planes[[plane, y, x]]);
        }
        Rgb(rgb)
    }))
}

/// Converts a float RGB image to `3 x H x W` planes in `order`.
///
/// Values are copied unchanged; images converted by `image` are already
/// normalized.
#[must_use]
pub fn float_image_to_planes(image: &Rgb32FImage, order: ChannelOrder) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let channels = plane_channels(order);
    Array3::from_shape_fn((3, height as usize, width as usize), |(plane, y, x)| {
        // dimensions came from u32
        #[allow(clippy::cast_possible_truncation)]
        let pixel = image.get_pixel(x as u32, y as u32);
        pixel.0[channels[plane]]
    })
}

/// Converts planes in `order` back to a float RGB image clamped to `[0, 1]`.
///
/// # Errors
///
/// Same as [`planes_to_image`].
pub fn planes_to_float_image(
    planes: ArrayView3<'_, f32>,
    order: ChannelOrder,
) -> Result<Rgb32FImage> {
    let (width, height) = image_dimensions(planes)?;
    let channels = plane_channels(order);
    Ok(Rgb32FImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let mut rgb = [0.0f32; 3];
        for (plane, &channel) in channels.iter().enumerate() {
            rgb[channel] = planes[[plane, y, x]].clamp(0.0, 1.0);
        }
        Rgb(rgb)
    }))
}

/// Converts `image` to the pixel encoding `color`.
///
/// Unknown encodings are returned unchanged.
#[must_use]
pub fn convert_to(image: DynamicImage, color: ColorType) -> DynamicImage {
    if image.color() == color {
        return image;
    }
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorType::Rgba8 => DynamicImage::ImageRgba8(image.to_rgba8()),
        ColorType::L16 => DynamicImage::ImageLuma16(image.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(image.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(image.to_rgba32f()),
        _ => image,
    }
}

/// Checks for three planes and returns `(width, height)` as `u32`.
fn image_dimensions(planes: ArrayView3<'_, f32>) -> Result<(u32, u32)> {
    let (channels, height, width) = planes.dim();
    if channels != 3 {
        return Err(Error::mismatch("number of channels", 3, channels));
    }
    let width = u32::try_from(width)
        .map_err(|_| Error::Precondition(format!("image width {width} is too large")))?;
    let height = u32::try_from(height)
        .map_err(|_| Error::Precondition(format!("image height {height} is too large")))?;
    Ok((width, height))
}

// clamp guarantees 0.0..=255.0
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0).round() as u8
}
