use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::error::{InvalidVolumeError, LoadVolumeError};
use crate::{Idx2d, Idx3d};

mod npz;
pub mod slice;
pub mod window;

pub use slice::{ImgEncodePng, ScanSlice, SliceIter};
pub use window::MinMaxWindow;

/// 3D CT 扫描体数据. 体素值以 `f32` 保存.
///
/// 对外的轴顺序是 (行, 列, 切片) 即 `(H, W, N)`; 内部按 `(N, H, W)` 存储,
/// 使每张切片都是连续的行优先视图.
///
/// 构造后只读.
#[derive(Debug, Clone)]
pub struct CtVolume {
    data: Array3<f32>,
}

impl Index<Idx3d> for CtVolume {
    type Output = f32;

    /// 按 `(切片, 高, 宽)` 访问.
    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CtVolume {
    /// 从 `(H, W, N)` 排列的数组构造体数据.
    ///
    /// 任一维度为 0 时返回 `Err(InvalidVolumeError::Empty)`.
    pub fn from_hwn(data: Array3<f32>) -> Result<Self, InvalidVolumeError> {
        let (h, w, n) = data.dim();
        if h == 0 || w == 0 || n == 0 {
            return Err(InvalidVolumeError::Empty { shape: (h, w, n) });
        }
        // [H, W, N] -> [N, H, W].
        let data = data.permuted_axes([2, 0, 1]);
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().to_owned()
        };
        debug_assert!(data.is_standard_layout());
        Ok(Self { data })
    }

    /// 从任意维数的 `(H, W, N)` 数组构造体数据.
    ///
    /// 维数不为 3 时返回 `Err(InvalidVolumeError::NotThreeDimensional)`.
    pub fn from_dyn(data: ArrayD<f32>) -> Result<Self, InvalidVolumeError> {
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| InvalidVolumeError::NotThreeDimensional { ndim })?;
        Self::from_hwn(data)
    }

    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    ///
    /// nifti 的体素数组按 `[W, H, z]` 组织, 原第一维向右增长, 原第二维向下增长.
    pub fn open_nifti<P: AsRef<Path>>(path: P) -> Result<Self, LoadVolumeError> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let data = obj.into_volume().into_ndarray::<f32>()?;
        if data.ndim() != 3 {
            return Err(InvalidVolumeError::NotThreeDimensional { ndim: data.ndim() }.into());
        }
        // [W, H, z] -> [H, W, z].
        let data = data.permuted_axes([1, 0, 2].as_slice());
        Ok(Self::from_dyn(data)?)
    }

    /// 打开 npz 归档中名为 `key` 的 `(H, W, N)` 体数据.
    ///
    /// 接受 `f32`, `f64`, `i16`, `u8` 元素类型, 统一转换为 `f32`.
    #[inline]
    pub fn open_npz<P: AsRef<Path>>(path: P, key: &str) -> Result<Self, LoadVolumeError> {
        Ok(Self::from_dyn(npz::read_volume(path.as_ref(), key)?)?)
    }

    /// 打开一张二维图像 (PNG, JPEG 等), 作为只有一张切片的体数据.
    ///
    /// 彩色图像按亮度转为灰度, 像素值保持 `[0, 255]` 原值.
    pub fn open_image<P: AsRef<Path>>(path: P) -> Result<Self, LoadVolumeError> {
        let img = image::open(path.as_ref())?.to_luma8();
        let (w, h) = img.dimensions();
        let data = Array3::from_shape_fn((h as usize, w as usize, 1), |(y, x, _)| {
            img.get_pixel(x as u32, y as u32).0[0] as f32
        });
        Ok(Self::from_hwn(data)?)
    }

    /// 数据形状 `(N, H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 单张切片的形状 `(H, W)`.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获取第 `z_index` 张切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(z_index, self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代 `(索引, 切片)` 的迭代器.
    ///
    /// 迭代器是惰性的, 可以 `clone` 后重新开始.
    #[inline]
    pub fn slice_iter(&self) -> SliceIter<'_> {
        SliceIter::new(self)
    }

    /// 获得数据的一份不可变 shallow copy, 按 `(N, H, W)` 排列.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn test_from_hwn_axes() {
        // (H, W, N) = (2, 3, 4), 值编码坐标.
        let data = Array3::from_shape_fn((2, 3, 4), |(h, w, n)| (100 * n + 10 * h + w) as f32);
        let vol = CtVolume::from_hwn(data).unwrap();
        assert_eq!(vol.shape(), (4, 2, 3));
        assert_eq!(vol.slice_shape(), (2, 3));
        assert_eq!(vol.len_z(), 4);
        assert_eq!(vol[(3, 1, 2)], 312.0);
        assert!(vol.data().is_standard_layout());

        let s = vol.slice_at(2);
        assert_eq!(s.index(), 2);
        assert_eq!(s[(1, 0)], 210.0);
    }

    #[test]
    fn test_invalid_volume() {
        let empty = Array3::<f32>::zeros((4, 4, 0));
        assert_eq!(
            CtVolume::from_hwn(empty).unwrap_err(),
            InvalidVolumeError::Empty { shape: (4, 4, 0) }
        );

        let flat = Array::<f32, _>::zeros(IxDyn(&[4, 4]));
        assert_eq!(
            CtVolume::from_dyn(flat).unwrap_err(),
            InvalidVolumeError::NotThreeDimensional { ndim: 2 }
        );

        let four = Array::<f32, _>::zeros(IxDyn(&[2, 2, 2, 2]));
        assert_eq!(
            CtVolume::from_dyn(four).unwrap_err(),
            InvalidVolumeError::NotThreeDimensional { ndim: 4 }
        );
    }

    #[test]
    fn test_open_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.png");
        let img = image::GrayImage::from_fn(3, 2, |x, y| image::Luma([(10 * x + 100 * y) as u8]));
        img.save(&path).unwrap();

        let vol = CtVolume::open_image(&path).unwrap();
        assert_eq!(vol.shape(), (1, 2, 3));
        assert_eq!(vol[(0, 1, 2)], 120.0);

        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"not an image").unwrap();
        assert!(matches!(
            CtVolume::open_image(&junk),
            Err(LoadVolumeError::Image(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.npz");
        assert!(matches!(
            CtVolume::open_npz(&missing, "volume"),
            Err(LoadVolumeError::Io { .. })
        ));
    }
}
