use std::path::Path;

use candle_core::{DType, Device, Tensor};

/// Side length the classifier expects.
pub const IMAGE_SIZE: usize = 299;

/// Loads an image from disk using the image crate, this returns a tensor with shape
/// (1, 3, 299, 299). Pixel values are scaled to [0, 1].
pub fn load_image(p: &Path) -> candle_core::Result<Tensor> {
    let img = image::ImageReader::open(p)?
        .with_guessed_format()?
        .decode()
        .map_err(candle_core::Error::wrap)?
        .resize_exact(
            IMAGE_SIZE as u32,
            IMAGE_SIZE as u32,
            image::imageops::FilterType::Nearest,
        );
    let img = img.to_rgb8();
    let data = img.into_raw();
    let data = Tensor::from_vec(data, (IMAGE_SIZE, IMAGE_SIZE, 3), &Device::Cpu)?.permute((2, 0, 1))?;
    (data.to_dtype(DType::F32)? / 255.)?.unsqueeze(0)
}
