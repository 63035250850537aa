use super::{RawPrediction, SliceClassifier};
use crate::error::ClassifyError;
use crate::preprocess::{InputKind, NormalizedSlice};

/// 以闭包实现的分类器. 适用于进程内模型.
pub struct FnClassifier<F> {
    f: F,
    kind: InputKind,
    concurrent: bool,
}

impl<F> FnClassifier<F>
where
    F: Fn(&NormalizedSlice) -> Result<RawPrediction, ClassifyError> + Sync,
{
    /// 包装 `f`. 默认只需灰度图像, 且不可并发.
    #[inline]
    pub fn new(f: F) -> Self {
        Self {
            f,
            kind: InputKind::Gray8,
            concurrent: false,
        }
    }

    /// 指定输入表示.
    #[inline]
    pub fn with_input(mut self, kind: InputKind) -> Self {
        self.kind = kind;
        self
    }

    /// 声明 `f` 是否可以被并发调用.
    #[inline]
    pub fn concurrent(mut self, yes: bool) -> Self {
        self.concurrent = yes;
        self
    }
}

impl<F> SliceClassifier for FnClassifier<F>
where
    F: Fn(&NormalizedSlice) -> Result<RawPrediction, ClassifyError> + Sync,
{
    #[inline]
    fn input_kind(&self) -> InputKind {
        self.kind
    }

    #[inline]
    fn classify(&self, input: &NormalizedSlice) -> Result<RawPrediction, ClassifyError> {
        (self.f)(input)
    }

    #[inline]
    fn is_concurrent(&self) -> bool {
        self.concurrent
    }
}
