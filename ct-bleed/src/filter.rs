//! 退化切片过滤.
//!
//! 近乎常数的切片 (全背景, 全零填充) 不含诊断信息. 它们若进入分类器,
//! 只会给融合结果带来貌似高置信度的噪声, 因此在分类之前剔除.

use crate::ScanSlice;

/// 过滤判定.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Verdict {
    /// 保留, 附带切片标准差.
    Retain(f64),

    /// 剔除, 附带切片标准差 (可能为 NaN).
    Reject(f64),
}

impl Verdict {
    /// 是否保留?
    #[inline]
    pub fn is_retained(&self) -> bool {
        matches!(self, Self::Retain(_))
    }
}

/// 基于标准差的切片过滤器.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliceFilter {
    min_std: f64,
}

impl SliceFilter {
    /// 标准差严格小于 `min_std` 的切片会被剔除.
    #[inline]
    pub fn new(min_std: f64) -> Self {
        Self { min_std }
    }

    /// 阈值.
    #[inline]
    pub fn min_std(&self) -> f64 {
        self.min_std
    }

    /// 判定 `slice` 的去留. 标准差为 NaN (切片含非有限值) 时同样剔除.
    pub fn check(&self, slice: &ScanSlice<'_>) -> Verdict {
        let std = slice.std_dev();
        if std >= self.min_std {
            Verdict::Retain(std)
        } else {
            log::debug!(
                "slice {} rejected: std {std:.3e} < {:.3e}",
                slice.index(),
                self.min_std
            );
            Verdict::Reject(std)
        }
    }

    /// 是否保留 `slice`?
    #[inline]
    pub fn retain(&self, slice: &ScanSlice<'_>) -> bool {
        self.check(slice).is_retained()
    }
}
