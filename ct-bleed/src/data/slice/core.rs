use crate::Idx2d;
use itertools::{Itertools, MinMaxResult};
use ndarray::iter::Iter;
use ndarray::{ArrayView2, Ix2};
use std::ops::Index;

/// 不可变、借用的二维 CT 扫描切片, 同时记录它在体数据中的索引.
#[derive(Clone, Copy, Debug)]
pub struct ScanSlice<'a> {
    index: usize,

    /// 底层数据的轻量级视图, 借用于 [`crate::CtVolume`].
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> ScanSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(index: usize, data: ArrayView2<'a, f32>) -> Self {
        Self { index, data }
    }

    /// 切片在体数据中的索引.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'a, f32> {
        self.data
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f32, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 像素平均值. 以 `f64` 累加.
    pub fn mean(&self) -> f64 {
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        sum / self.size() as f64
    }

    /// 像素的总体标准差 (除以 `n` 而不是 `n - 1`).
    ///
    /// 存在非有限值 (inf, NaN) 时结果为 NaN.
    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let var: f64 = self
            .data
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.size() as f64;
        var.sqrt()
    }

    /// 有限像素值中的 (最小值, 最大值). 若没有有限像素值, 返回 `None`.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        match self.data.iter().copied().filter(|v| v.is_finite()).minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::ScanSlice;
    use ndarray::{arr2, Array2};

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_statistics() {
        let data = arr2(&[[2.0f32, 4.0], [4.0, 4.0], [5.0, 5.0], [7.0, 9.0]]);
        let s = ScanSlice::new(3, data.view());
        assert_eq!(s.index(), 3);
        assert_eq!(s.shape(), (4, 2));
        assert_eq!(s.size(), 8);
        assert!(float_eq(s.mean(), 5.0));
        assert!(float_eq(s.std_dev(), 2.0));
        assert_eq!(s.min_max(), Some((2.0, 9.0)));
    }

    #[test]
    fn test_uniform_slice() {
        let data = Array2::from_elem((5, 5), -1024.0f32);
        let s = ScanSlice::new(0, data.view());
        assert_eq!(s.std_dev(), 0.0);
        assert_eq!(s.min_max(), Some((-1024.0, -1024.0)));
    }

    #[test]
    fn test_non_finite() {
        let data = arr2(&[[f32::NAN, 1.0], [3.0, f32::INFINITY]]);
        let s = ScanSlice::new(0, data.view());
        assert!(s.std_dev().is_nan());
        assert_eq!(s.min_max(), Some((1.0, 3.0)));

        let data = arr2(&[[f32::NAN]]);
        assert_eq!(ScanSlice::new(0, data.view()).min_max(), None);
    }
}
