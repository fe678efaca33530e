use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::Array4;

use super::model::InputSpec;
use crate::task::engine::EngineError;
use crate::task::packet::NormalizedRect;

/// Crops, rotates and resizes `image` into the model's input tensor.
pub fn prepare_input(
    image: &DynamicImage,
    rect: &NormalizedRect,
    spec: &InputSpec,
) -> Result<Array4<f32>, EngineError> {
    if spec.std <= 0.0 || spec.width == 0 || spec.height == 0 {
        return Err(EngineError::Model(format!("invalid input spec {:?}", spec)));
    }

    let cropped = crop(image, rect)?;
    let rotated = rotate_clockwise(cropped, clockwise_degrees(rect.rotation))?;
    let resized = if rotated.width() == spec.width && rotated.height() == spec.height {
        rotated
    } else {
        rotated.resize_exact(spec.width, spec.height, FilterType::Triangle)
    };

    let rgb = resized.to_rgb8();
    let tensor = Array4::from_shape_fn(
        (1, spec.height as usize, spec.width as usize, 3),
        |(_, y, x, c)| (rgb.get_pixel(x as u32, y as u32)[c] as f32 - spec.mean) / spec.std,
    );
    Ok(tensor)
}

fn crop(image: &DynamicImage, rect: &NormalizedRect) -> Result<DynamicImage, EngineError> {
    if *rect == NormalizedRect::default() {
        return Ok(image.clone());
    }
    let (width, height) = (image.width() as f32, image.height() as f32);
    let to_pixels = |value: f32, extent: f32| (value * extent).round().clamp(0.0, extent) as u32;

    let left = to_pixels(rect.x_center - rect.width / 2.0, width);
    let right = to_pixels(rect.x_center + rect.width / 2.0, width);
    let top = to_pixels(rect.y_center - rect.height / 2.0, height);
    let bottom = to_pixels(rect.y_center + rect.height / 2.0, height);
    if right <= left || bottom <= top {
        return Err(EngineError::InvalidPacket(format!(
            "region of interest {:?} is empty on a {}x{} image",
            rect,
            image.width(),
            image.height()
        )));
    }
    Ok(image.crop_imm(left, top, right - left, bottom - top))
}

fn clockwise_degrees(rotation: f32) -> i32 {
    (-rotation.to_degrees()).round() as i32
}

fn rotate_clockwise(image: DynamicImage, degrees: i32) -> Result<DynamicImage, EngineError> {
    match degrees.rem_euclid(360) {
        0 => Ok(image),
        90 => Ok(image.rotate90()),
        180 => Ok(image.rotate180()),
        270 => Ok(image.rotate270()),
        other => Err(EngineError::InvalidPacket(format!(
            "rotation of {} degrees is not a multiple of 90",
            other
        ))),
    }
}
