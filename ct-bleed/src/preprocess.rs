//! 切片归一化.
//!
//! 每张保留下来的切片产生三种表示:
//!
//! 1. `[0, 1]` 浮点图像;
//! 2. `[0, 255]` 8-bit 灰度图像, 用于渲染, 审计, 以及只接受图像的分类器;
//! 3. 可选的 `(3, S, S)` 分类器张量: 双线性缩放, 三通道复制, 按通道标准化.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageResult, Luma};
use ndarray::{Array2, Array3};

use crate::config::NormalizeConfig;
use crate::{ImgEncodePng, MinMaxWindow, ScanSlice};

/// 分类器需要的输入表示.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// 仅需 8-bit 灰度图像.
    Gray8,

    /// 还需要标准化后的 `(3, S, S)` 张量.
    Tensor,
}

/// 归一化后的切片. 不持有原始切片的借用.
#[derive(Clone, Debug)]
pub struct NormalizedSlice {
    index: usize,
    unit: Array2<f32>,
    gray: Array2<u8>,
    tensor: Option<Array3<f32>>,
}

impl NormalizedSlice {
    /// 原始切片索引.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// `[0, 1]` 浮点图像.
    #[inline]
    pub fn unit(&self) -> &Array2<f32> {
        &self.unit
    }

    /// `[0, 255]` 灰度图像.
    #[inline]
    pub fn gray(&self) -> &Array2<u8> {
        &self.gray
    }

    /// 分类器张量. 仅当以 [`InputKind::Tensor`] 归一化时存在.
    #[inline]
    pub fn tensor(&self) -> Option<&Array3<f32>> {
        self.tensor.as_ref()
    }

    /// 把灰度图像编码为 PNG.
    #[inline]
    pub fn encode_png(&self) -> ImageResult<Vec<u8>> {
        self.gray.encode_png()
    }
}

/// 切片归一化器.
#[derive(Copy, Clone, Debug)]
pub struct SliceNormalizer {
    config: NormalizeConfig,
}

impl SliceNormalizer {
    /// 以 `config` 创建归一化器. 参数合法性由调用方负责 ([`NormalizeConfig::validate`]).
    #[inline]
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    /// 归一化 `slice`. 当 `kind` 为 [`InputKind::Tensor`] 时同时生成分类器张量.
    pub fn normalize(&self, slice: &ScanSlice<'_>, kind: InputKind) -> NormalizedSlice {
        let window = MinMaxWindow::from_slice(slice, self.config.eps);
        let unit = slice.data().mapv(|v| window.eval_unit(v));
        let gray = slice.data().mapv(|v| window.eval(v));
        let tensor = match kind {
            InputKind::Gray8 => None,
            InputKind::Tensor => Some(self.tensor(&gray)),
        };
        NormalizedSlice {
            index: slice.index(),
            unit,
            gray,
            tensor,
        }
    }

    /// 缩放, 复制通道, 标准化. 结果按 `(C, H, W)` 排列.
    fn tensor(&self, gray: &Array2<u8>) -> Array3<f32> {
        let (h, w) = gray.dim();
        let img = GrayImage::from_fn(w as u32, h as u32, |x, y| {
            Luma([gray[(y as usize, x as usize)]])
        });
        let size = self.config.input_size;
        let resized = imageops::resize(&img, size, size, FilterType::Triangle);

        let NormalizeConfig { mean, std, .. } = self.config;
        let size = size as usize;
        Array3::from_shape_fn((3, size, size), |(c, y, x)| {
            let v = resized.get_pixel(x as u32, y as u32).0[0] as f32 / 255.0;
            (v - mean[c]) / std[c]
        })
    }
}
