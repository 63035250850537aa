//! 最终诊断选择.

use crate::error::LabelSetError;
use crate::label::{LabelSet, LabelVector};

/// 在 `scores` 中选出分数最高的非聚合标签, 返回其位置.
///
/// 分数相同时按标签声明顺序, 先声明者胜出.
/// 若标签集合中没有非聚合标签, 返回 `Err(LabelSetError::OnlyAggregate)`;
/// 合法构造的 [`LabelSet`] 不会出现这种情况.
///
/// `scores` 长度与标签集合不一致时程序 panic.
pub fn select_diagnosis(labels: &LabelSet, scores: &LabelVector) -> Result<usize, LabelSetError> {
    assert_eq!(labels.len(), scores.len(), "标签向量长度不一致");
    let mut best: Option<(usize, f64)> = None;
    for i in labels.diagnostic_indices() {
        let s = scores.scores()[i];
        // 严格大于: 保留先声明者.
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
        .ok_or_else(|| LabelSetError::OnlyAggregate(labels.aggregate_name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(scores: &[f64]) -> LabelVector {
        LabelVector::checked(scores.to_vec(), scores.len()).unwrap()
    }

    #[test]
    fn test_excludes_aggregate() {
        let labels = LabelSet::new(["A", "B", "Any"], "Any").unwrap();
        assert_eq!(select_diagnosis(&labels, &v(&[10.0, 20.0, 70.0])), Ok(1));
        assert_eq!(select_diagnosis(&labels, &v(&[45.7, 51.4, 2.9])), Ok(1));
    }

    #[test]
    fn test_tie_first_declared() {
        let labels = LabelSet::hemorrhage();
        let tie = v(&[0.0, 30.0, 10.0, 30.0, 0.0, 30.0]);
        assert_eq!(select_diagnosis(&labels, &tie), Ok(1));

        let zeros = LabelVector::zeros(6);
        assert_eq!(select_diagnosis(&labels, &zeros), Ok(0));
    }

    #[test]
    fn test_aggregate_first() {
        let labels = LabelSet::new(["Any", "A", "B"], "Any").unwrap();
        assert_eq!(select_diagnosis(&labels, &v(&[99.0, 0.5, 0.5])), Ok(1));
    }
}
