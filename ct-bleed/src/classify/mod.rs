//! 切片分类器适配.
//!
//! 流水线不关心模型内部, 只约定输入表示 ([`InputKind`]) 和输出形态 ([`RawPrediction`]).
//! 分类器的两种常见输出:
//!
//! 1. 多标签风险打分: 每个标签一个独立分数 (例如独立的 sigmoid), 总和不固定;
//! 2. 单标签分类: 只给出获胜标签名, 其余标签视为 0.
//!
//! 两者都在进入融合之前通过 [`RawPrediction::into_label_vector`] 映射为
//! [`LabelVector`], 因此更换分类器不会影响融合与诊断逻辑.

use crate::error::ClassifyError;
use crate::label::{LabelSet, LabelVector};
use crate::preprocess::{InputKind, NormalizedSlice};

mod closure;
mod command;

pub use closure::FnClassifier;
pub use command::CommandClassifier;

/// 分类器的原始输出.
#[derive(Clone, Debug, PartialEq)]
pub enum RawPrediction {
    /// 按标签集合声明顺序排列的分数.
    Scores(Vec<f64>),

    /// `(标签名, 分数)` 对, 顺序任意, 但必须覆盖全部标签.
    Named(Vec<(String, f64)>),

    /// 单个获胜标签名. 映射为独热向量.
    Label(String),
}

impl RawPrediction {
    /// 按 `labels` 映射为标签向量. 标签名匹配不区分 ASCII 大小写.
    ///
    /// 长度不符, 标签未知或缺失, 分数为负或非有限时,
    /// 返回 `Err(ClassifyError::Unparseable)`.
    pub fn into_label_vector(self, labels: &LabelSet) -> Result<LabelVector, ClassifyError> {
        match self {
            Self::Scores(scores) => {
                LabelVector::checked(scores, labels.len()).map_err(ClassifyError::Unparseable)
            }
            Self::Named(pairs) => {
                let mut slots: Vec<Option<f64>> = vec![None; labels.len()];
                for (name, score) in pairs {
                    let pos = labels
                        .position(&name)
                        .ok_or_else(|| ClassifyError::Unparseable(format!("未知标签 `{name}`")))?;
                    if slots[pos].replace(score).is_some() {
                        return Err(ClassifyError::Unparseable(format!("标签 `{name}` 重复")));
                    }
                }
                let scores = slots
                    .into_iter()
                    .enumerate()
                    .map(|(i, s)| {
                        s.ok_or_else(|| {
                            ClassifyError::Unparseable(format!(
                                "缺少标签 `{}`",
                                labels.names()[i]
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                LabelVector::checked(scores, labels.len()).map_err(ClassifyError::Unparseable)
            }
            Self::Label(name) => labels
                .position(&name)
                .map(|pos| LabelVector::one_hot(labels.len(), pos))
                .ok_or_else(|| ClassifyError::Unparseable(format!("未知标签 `{}`", name.trim()))),
        }
    }
}

/// 切片分类能力.
///
/// 实现者只需给出 `classify`. 若底层能力可以安全地被并发调用,
/// 应覆写 `is_concurrent` 返回 `true`; 否则流水线会串行调用.
pub trait SliceClassifier: Sync {
    /// 需要的输入表示. 默认只需 8-bit 灰度图像.
    #[inline]
    fn input_kind(&self) -> InputKind {
        InputKind::Gray8
    }

    /// 分类一张归一化后的切片.
    fn classify(&self, input: &NormalizedSlice) -> Result<RawPrediction, ClassifyError>;

    /// 是否可以被并发调用. 默认 `false`.
    #[inline]
    fn is_concurrent(&self) -> bool {
        false
    }
}

impl<T: SliceClassifier + ?Sized> SliceClassifier for &T {
    #[inline]
    fn input_kind(&self) -> InputKind {
        (**self).input_kind()
    }

    #[inline]
    fn classify(&self, input: &NormalizedSlice) -> Result<RawPrediction, ClassifyError> {
        (**self).classify(input)
    }

    #[inline]
    fn is_concurrent(&self) -> bool {
        (**self).is_concurrent()
    }
}

impl<T: SliceClassifier + ?Sized> SliceClassifier for Box<T> {
    #[inline]
    fn input_kind(&self) -> InputKind {
        (**self).input_kind()
    }

    #[inline]
    fn classify(&self, input: &NormalizedSlice) -> Result<RawPrediction, ClassifyError> {
        (**self).classify(input)
    }

    #[inline]
    fn is_concurrent(&self) -> bool {
        (**self).is_concurrent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::new(["A", "B", "Any"], "Any").unwrap()
    }

    #[test]
    fn test_scores() {
        let v = RawPrediction::Scores(vec![0.8, 0.1, 0.05])
            .into_label_vector(&labels())
            .unwrap();
        assert_eq!(v.scores(), [0.8, 0.1, 0.05]);

        let short = RawPrediction::Scores(vec![0.8, 0.1]).into_label_vector(&labels());
        assert!(matches!(short, Err(ClassifyError::Unparseable(_))));

        let negative = RawPrediction::Scores(vec![0.8, -0.1, 0.0]).into_label_vector(&labels());
        assert!(matches!(negative, Err(ClassifyError::Unparseable(_))));
    }

    #[test]
    fn test_named() {
        let v = RawPrediction::Named(vec![
            ("any".into(), 0.3),
            ("b".into(), 0.2),
            ("A".into(), 0.1),
        ])
        .into_label_vector(&labels())
        .unwrap();
        assert_eq!(v.scores(), [0.1, 0.2, 0.3]);

        let missing = RawPrediction::Named(vec![("A".into(), 0.1), ("B".into(), 0.2)])
            .into_label_vector(&labels());
        assert!(matches!(missing, Err(ClassifyError::Unparseable(_))));

        let unknown = RawPrediction::Named(vec![("C".into(), 0.1)]).into_label_vector(&labels());
        assert!(matches!(unknown, Err(ClassifyError::Unparseable(_))));

        let twice = RawPrediction::Named(vec![
            ("A".into(), 0.1),
            ("a".into(), 0.1),
            ("B".into(), 0.1),
            ("Any".into(), 0.1),
        ])
        .into_label_vector(&labels());
        assert!(matches!(twice, Err(ClassifyError::Unparseable(_))));
    }

    #[test]
    fn test_single_label() {
        let v = RawPrediction::Label("b\n".into())
            .into_label_vector(&labels())
            .unwrap();
        assert_eq!(v.scores(), [0.0, 1.0, 0.0]);

        let unknown = RawPrediction::Label("unknown".into()).into_label_vector(&labels());
        assert!(matches!(unknown, Err(ClassifyError::Unparseable(_))));
    }
}
