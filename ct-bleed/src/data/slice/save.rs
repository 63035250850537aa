//! 灰度图像的 PNG 编码.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageResult};
use ndarray::Array2;

/// 表明一个可以编码为单通道 8-bit PNG 的图像对象.
///
/// 像素按原样编码, CT 值应先经 [`crate::MinMaxWindow`] 映射到 `[0, 255]`.
///
/// 编码结果不包含时间戳等元数据, 相同输入得到逐字节相同的输出.
pub trait ImgEncodePng {
    /// 编码为 PNG 字节.
    fn encode_png(&self) -> ImageResult<Vec<u8>>;
}

/// 把行优先的灰度像素编码为 PNG.
fn encode_gray(pixels: &[u8], (height, width): (usize, usize)) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(pixels.len() / 2 + 64);
    PngEncoder::new(&mut buf).write_image(pixels, width as u32, height as u32, ColorType::L8)?;
    Ok(buf)
}

macro_rules! impl_gray_raw {
    ($($gray: ty),+) => {
        $(
            /// 按原样编码.
            impl ImgEncodePng for $gray {
                fn encode_png(&self) -> ImageResult<Vec<u8>> {
                    let pixels: Vec<u8> = self.iter().copied().collect();
                    encode_gray(&pixels, self.dim())
                }
            }
        )+
    };
}

impl_gray_raw!(Array2<u8>);
