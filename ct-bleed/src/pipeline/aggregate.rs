//! 切片级分数向量的融合.
//!
//! 体级原始向量取各保留切片原始向量的逐元素最大值: 只要有一张切片给出了某种出血的强证据,
//! 该证据就应主导体级估计, 而不是被其余正常切片平均稀释.
//!
//! 最危险切片按切片风险选取: 除聚合标签外的最大 **原始** 分数 (单切片归一化之前).

use crate::label::{LabelSet, LabelVector};

/// 融合结果.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    /// 逐元素最大值.
    pub raw: LabelVector,

    /// `raw` 缩放到总和为 100; `raw` 全零时为全零.
    pub normalized: LabelVector,

    /// 最危险切片的索引.
    pub most_risky: usize,

    /// 最危险切片的风险值.
    pub risk: f64,
}

impl Aggregate {
    /// 原始分数是否全为 0 (融合结果不含信息)?
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.raw.is_zero()
    }
}

/// 单遍融合器. 额外内存只有逐标签的当前最大值和当前最危险切片.
///
/// 最危险切片在风险相同的情况下取索引最小者, 与 `push` 的顺序无关.
#[derive(Clone, Debug)]
pub struct Aggregator {
    aggregate_index: usize,
    maxima: LabelVector,
    best: Option<(usize, f64)>,
    count: usize,
}

impl Aggregator {
    /// 为 `labels` 创建融合器.
    pub fn new(labels: &LabelSet) -> Self {
        Self {
            aggregate_index: labels.aggregate_index(),
            maxima: LabelVector::zeros(labels.len()),
            best: None,
            count: 0,
        }
    }

    /// 已融合的切片数.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// 融合第 `index` 张切片的原始向量.
    ///
    /// 向量长度与标签集合不一致时程序 panic.
    pub fn push(&mut self, index: usize, raw: &LabelVector) {
        self.maxima.max_assign(raw);
        self.count += 1;

        // 合法标签集合至少有一个非聚合标签.
        let risk = raw.max_excluding(self.aggregate_index).unwrap_or(0.0);
        let replace = match self.best {
            None => true,
            Some((best_index, best_risk)) => {
                risk > best_risk || (risk == best_risk && index < best_index)
            }
        };
        if replace {
            self.best = Some((index, risk));
        }
    }

    /// 结束融合. 若没有融合任何切片, 返回 `None`.
    pub fn finish(self) -> Option<Aggregate> {
        let (most_risky, risk) = self.best?;
        let normalized = self.maxima.renormalized();
        Some(Aggregate {
            raw: self.maxima,
            normalized,
            most_risky,
            risk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::new(["A", "B", "Any"], "Any").unwrap()
    }

    fn v(scores: [f64; 3]) -> LabelVector {
        LabelVector::checked(scores.to_vec(), 3).unwrap()
    }

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_worked_example() {
        let mut agg = Aggregator::new(&labels());
        agg.push(1, &v([80.0, 10.0, 5.0]));
        agg.push(2, &v([30.0, 90.0, 5.0]));
        let out = agg.finish().unwrap();

        assert_eq!(out.raw.scores(), [80.0, 90.0, 5.0]);
        let n = out.normalized.scores();
        assert!(approx(n[0], 45.7, 0.05));
        assert!(approx(n[1], 51.4, 0.05));
        assert!(approx(n[2], 2.9, 0.05));
        assert!(approx(out.normalized.sum(), 100.0, 1e-9));
        assert_eq!(out.most_risky, 2);
        assert_eq!(out.risk, 90.0);
        assert!(!out.is_degenerate());
    }

    #[test]
    fn test_empty() {
        assert!(Aggregator::new(&labels()).finish().is_none());
    }

    #[test]
    fn test_aggregate_label_does_not_count_as_risk() {
        let mut agg = Aggregator::new(&labels());
        agg.push(0, &v([0.2, 0.1, 0.99]));
        agg.push(1, &v([0.3, 0.1, 0.01]));
        let out = agg.finish().unwrap();
        assert_eq!(out.most_risky, 1);
        assert_eq!(out.raw.scores(), [0.3, 0.1, 0.99]);
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let vectors = [(3, v([0.5, 0.1, 0.0])), (5, v([0.1, 0.5, 0.0])), (4, v([0.5, 0.5, 0.0]))];

        let mut forward = Aggregator::new(&labels());
        for (i, x) in vectors.iter() {
            forward.push(*i, x);
        }
        let mut backward = Aggregator::new(&labels());
        for (i, x) in vectors.iter().rev() {
            backward.push(*i, x);
        }
        assert_eq!(forward.finish().unwrap().most_risky, 3);
        assert_eq!(backward.finish().unwrap().most_risky, 3);
    }

    #[test]
    fn test_permutation_invariant() {
        let vectors = [
            v([0.9, 0.0, 0.3]),
            v([0.1, 0.4, 0.8]),
            v([0.2, 0.7, 0.1]),
            v([0.0, 0.0, 0.0]),
        ];
        let orders: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]];
        let results: Vec<Aggregate> = orders
            .iter()
            .map(|order| {
                let mut agg = Aggregator::new(&labels());
                for &i in order {
                    agg.push(i, &vectors[i]);
                }
                agg.finish().unwrap()
            })
            .collect();
        for r in &results[1..] {
            assert_eq!(r, &results[0]);
        }
        assert_eq!(results[0].raw.scores(), [0.9, 0.7, 0.8]);
        assert_eq!(results[0].most_risky, 0);
    }

    #[test]
    fn test_degenerate() {
        let mut agg = Aggregator::new(&labels());
        agg.push(0, &LabelVector::zeros(3));
        agg.push(1, &LabelVector::zeros(3));
        let out = agg.finish().unwrap();
        assert!(out.is_degenerate());
        assert!(out.normalized.is_zero());
        assert_eq!(out.most_risky, 0);
    }
}
