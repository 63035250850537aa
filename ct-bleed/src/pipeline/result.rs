//! 切片级与体级结果.
//!
//! 结果一经创建即不可变, 只提供只读访问.

use std::sync::Arc;

use super::aggregate::Aggregate;
use crate::error::ClassifyError;
use crate::label::{LabelSet, LabelVector};

/// 单张切片的分类结局.
#[derive(Clone, Debug, PartialEq)]
pub enum SliceOutcome {
    /// 分类成功.
    Classified {
        /// 分类器原始分数.
        raw: LabelVector,
        /// `raw` 缩放到总和为 100.
        scores: LabelVector,
    },

    /// 分类失败. 该切片不参与融合.
    Failed(ClassifyError),
}

/// 一张保留切片 (未被过滤) 的结果.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceResult {
    index: usize,
    outcome: SliceOutcome,
    image: Vec<u8>,
}

impl SliceResult {
    pub(crate) fn classified(index: usize, raw: LabelVector, image: Vec<u8>) -> Self {
        let scores = raw.renormalized();
        Self {
            index,
            outcome: SliceOutcome::Classified { raw, scores },
            image,
        }
    }

    pub(crate) fn failed(index: usize, error: ClassifyError, image: Vec<u8>) -> Self {
        Self {
            index,
            outcome: SliceOutcome::Failed(error),
            image,
        }
    }

    /// 切片在体数据中的索引.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 分类结局.
    #[inline]
    pub fn outcome(&self) -> &SliceOutcome {
        &self.outcome
    }

    /// 原始分数. 分类失败时为 `None`.
    #[inline]
    pub fn raw_scores(&self) -> Option<&LabelVector> {
        match &self.outcome {
            SliceOutcome::Classified { raw, .. } => Some(raw),
            SliceOutcome::Failed(_) => None,
        }
    }

    /// 总和为 100 的分数. 分类失败时为 `None`.
    #[inline]
    pub fn scores(&self) -> Option<&LabelVector> {
        match &self.outcome {
            SliceOutcome::Classified { scores, .. } => Some(scores),
            SliceOutcome::Failed(_) => None,
        }
    }

    /// 分类错误. 分类成功时为 `None`.
    #[inline]
    pub fn error(&self) -> Option<&ClassifyError> {
        match &self.outcome {
            SliceOutcome::Classified { .. } => None,
            SliceOutcome::Failed(e) => Some(e),
        }
    }

    /// 是否分类成功?
    #[inline]
    pub fn is_classified(&self) -> bool {
        matches!(self.outcome, SliceOutcome::Classified { .. })
    }

    /// 8-bit 灰度渲染的 PNG 字节.
    #[inline]
    pub fn image_png(&self) -> &[u8] {
        &self.image
    }
}

/// 一次流水线运行的完整结果. 服务层只需持久化该结构.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeResult {
    source: String,
    slice_count: usize,
    labels: Arc<LabelSet>,
    slices: Vec<SliceResult>,
    aggregate: Aggregate,
    diagnosis: Option<usize>,
    filtered: usize,
}

impl VolumeResult {
    /// 组装结果. 不做额外计算; `slices` 的顺序原样保留.
    ///
    /// `diagnosis` 在融合结果退化时应为 `None`.
    pub(crate) fn assemble(
        source: String,
        slice_count: usize,
        labels: Arc<LabelSet>,
        slices: Vec<SliceResult>,
        aggregate: Aggregate,
        diagnosis: Option<usize>,
        filtered: usize,
    ) -> Self {
        debug_assert!(slices.windows(2).all(|w| w[0].index < w[1].index));
        Self {
            source,
            slice_count,
            labels,
            slices,
            aggregate,
            diagnosis,
            filtered,
        }
    }

    /// 数据来源标识 (例如文件名).
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 体数据的切片总数 (含被过滤的切片).
    #[inline]
    pub fn slice_count(&self) -> usize {
        self.slice_count
    }

    /// 标签集合.
    #[inline]
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// 保留切片的结果, 按切片索引升序.
    #[inline]
    pub fn slices(&self) -> &[SliceResult] {
        &self.slices
    }

    /// 体级原始分数 (逐元素最大值).
    #[inline]
    pub fn raw_scores(&self) -> &LabelVector {
        &self.aggregate.raw
    }

    /// 体级分数, 总和为 100 或全零.
    #[inline]
    pub fn scores(&self) -> &LabelVector {
        &self.aggregate.normalized
    }

    /// 最终诊断标签名. 融合结果退化时为 `None`.
    #[inline]
    pub fn diagnosis(&self) -> Option<&str> {
        self.diagnosis.and_then(|i| self.labels.name(i))
    }

    /// 最终诊断标签位置.
    #[inline]
    pub fn diagnosis_index(&self) -> Option<usize> {
        self.diagnosis
    }

    /// 最危险切片的索引.
    #[inline]
    pub fn most_risky_slice(&self) -> usize {
        self.aggregate.most_risky
    }

    /// 最危险切片的风险值 (原始分数).
    #[inline]
    pub fn most_risky_score(&self) -> f64 {
        self.aggregate.risk
    }

    /// 被过滤的退化切片数.
    #[inline]
    pub fn filtered_count(&self) -> usize {
        self.filtered
    }

    /// 分类失败的切片数.
    pub fn failed_count(&self) -> usize {
        self.slices.iter().filter(|s| !s.is_classified()).count()
    }

    /// 融合结果是否退化 (全部原始分数为 0)?
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.aggregate.is_degenerate()
    }
}
