//! 标签集合与标签分数向量.

use crate::consts::{ANY_LABEL, HEMORRHAGE_LABELS, SCORE_TOTAL};
use crate::error::LabelSetError;

/// 固定, 有序的诊断类别集合, 其中恰有一个聚合 ("任意类型") 标签.
///
/// 该集合是只读的. 流水线内部通过 `Arc<LabelSet>` 在切片级和体级结果之间共享.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "LabelSetRepr"))]
pub struct LabelSet {
    names: Vec<String>,
    aggregate: usize,
}

/// `LabelSet` 的未校验形式, 仅用于反序列化.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct LabelSetRepr {
    names: Vec<String>,
    #[serde(default = "default_aggregate")]
    aggregate: String,
}

#[cfg(feature = "serde")]
fn default_aggregate() -> String {
    ANY_LABEL.to_string()
}

#[cfg(feature = "serde")]
impl TryFrom<LabelSetRepr> for LabelSet {
    type Error = LabelSetError;

    fn try_from(repr: LabelSetRepr) -> Result<Self, Self::Error> {
        LabelSet::new(repr.names, &repr.aggregate)
    }
}

impl LabelSet {
    /// 构建标签集合. `aggregate` 是聚合标签名, 它必须出现在 `names` 中.
    ///
    /// # 返回值
    ///
    /// - `names` 为空时, 返回 `Err(LabelSetError::Empty)`;
    /// - 存在 (不区分 ASCII 大小写) 重复标签时, 返回 `Err(LabelSetError::Duplicate)`;
    /// - `aggregate` 不在 `names` 中时, 返回 `Err(LabelSetError::MissingAggregate)`;
    /// - 除 `aggregate` 外没有其它标签时, 返回 `Err(LabelSetError::OnlyAggregate)`.
    pub fn new<I, S>(names: I, aggregate: &str) -> Result<Self, LabelSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(LabelSetError::Empty);
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].iter().any(|prev| prev.eq_ignore_ascii_case(name)) {
                return Err(LabelSetError::Duplicate(name.clone()));
            }
        }
        let aggregate_index = names
            .iter()
            .position(|n| n == aggregate)
            .ok_or_else(|| LabelSetError::MissingAggregate(aggregate.to_string()))?;
        if names.len() == 1 {
            return Err(LabelSetError::OnlyAggregate(aggregate.to_string()));
        }
        Ok(Self {
            names,
            aggregate: aggregate_index,
        })
    }

    /// 颅内出血五分类 + `Any` 聚合标签.
    pub fn hemorrhage() -> Self {
        // 常量本身满足全部约束.
        Self {
            names: HEMORRHAGE_LABELS.iter().map(|s| s.to_string()).collect(),
            aggregate: HEMORRHAGE_LABELS.len() - 1,
        }
    }

    /// 标签个数 (含聚合标签).
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// 标签集合是否为空. 合法构造的集合永远非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 按声明顺序获取标签名.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 第 `index` 个标签名. 越界时返回 `None`.
    #[inline]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// 聚合标签的位置.
    #[inline]
    pub fn aggregate_index(&self) -> usize {
        self.aggregate
    }

    /// 聚合标签名.
    #[inline]
    pub fn aggregate_name(&self) -> &str {
        &self.names[self.aggregate]
    }

    /// 按 ASCII 大小写不敏感的方式查找标签位置.
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }

    /// 以声明顺序迭代可参与诊断的 (非聚合) 标签位置.
    #[inline]
    pub fn diagnostic_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&i| i != self.aggregate)
    }
}

impl Default for LabelSet {
    #[inline]
    fn default() -> Self {
        Self::hemorrhage()
    }
}

/// 与某个 [`LabelSet`] 对齐的非负有限分数向量.
///
/// 向量本身不持有标签集合, 对齐关系由构造者保证.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelVector {
    scores: Vec<f64>,
}

impl LabelVector {
    /// 长度为 `len` 的全零向量.
    #[inline]
    pub fn zeros(len: usize) -> Self {
        Self {
            scores: vec![0.0; len],
        }
    }

    /// 仅 `hot` 位置为 1 的独热向量.
    pub fn one_hot(len: usize, hot: usize) -> Self {
        let mut v = Self::zeros(len);
        v.scores[hot] = 1.0;
        v
    }

    /// 校验并构造. 分数个数必须为 `len`, 且每个分数非负有限.
    pub fn checked(scores: Vec<f64>, len: usize) -> Result<Self, String> {
        if scores.len() != len {
            return Err(format!("期望 {len} 个分数, 但得到了 {}", scores.len()));
        }
        if let Some((i, s)) = scores
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.0)
        {
            return Err(format!("第 {i} 个分数 `{s}` 不是非负有限数"));
        }
        Ok(Self { scores })
    }

    /// 分数切片.
    #[inline]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// 第 `index` 个分数.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.scores.get(index).copied()
    }

    /// 向量长度.
    #[inline]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// 向量是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// 分数之和.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.scores.iter().sum()
    }

    /// 所有分数是否都为 0?
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.scores.iter().all(|s| *s == 0.0)
    }

    /// 将分数缩放到总和为 100. 若原分数全为 0, 则返回全零向量.
    ///
    /// 先除以最大分数再求和, 接近 `f64::MAX` 的有限分数也不会溢出.
    pub fn renormalized(&self) -> Self {
        let peak = self.scores.iter().copied().fold(0.0, f64::max);
        if peak <= 0.0 {
            return Self::zeros(self.len());
        }
        let scaled: Vec<f64> = self.scores.iter().map(|s| s / peak).collect();
        // 每项不超过 1, 且最大项为 1.
        let total: f64 = scaled.iter().sum();
        Self {
            scores: scaled.into_iter().map(|s| s / total * SCORE_TOTAL).collect(),
        }
    }

    /// 除 `excluded` 位置外的最大分数. 若没有其它位置, 返回 `None`.
    pub fn max_excluding(&self, excluded: usize) -> Option<f64> {
        self.scores
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != excluded)
            .map(|(_, s)| *s)
            .reduce(f64::max)
    }

    /// 与 `other` 逐元素取最大值, 结果写回 `self`.
    ///
    /// 两者长度不一致时程序 panic.
    pub fn max_assign(&mut self, other: &LabelVector) {
        assert_eq!(self.len(), other.len(), "标签向量长度不一致");
        for (acc, s) in self.scores.iter_mut().zip(other.scores.iter()) {
            *acc = acc.max(*s);
        }
    }

    /// 与 `labels` 配对, 按声明顺序迭代 `(标签名, 分数)`.
    pub fn labeled<'a>(&'a self, labels: &'a LabelSet) -> impl Iterator<Item = (&'a str, f64)> {
        labels
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_label_set_invalid_input() {
        assert_eq!(
            LabelSet::new(Vec::<String>::new(), "Any"),
            Err(LabelSetError::Empty)
        );
        assert_eq!(
            LabelSet::new(["A", "a", "Any"], "Any"),
            Err(LabelSetError::Duplicate("a".into()))
        );
        assert_eq!(
            LabelSet::new(["A", "B"], "Any"),
            Err(LabelSetError::MissingAggregate("Any".into()))
        );
        assert_eq!(
            LabelSet::new(["Any"], "Any"),
            Err(LabelSetError::OnlyAggregate("Any".into()))
        );
    }

    #[test]
    fn test_hemorrhage_preset() {
        let labels = LabelSet::hemorrhage();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels.aggregate_name(), "Any");
        assert_eq!(labels.position("subdural"), Some(4));
        assert_eq!(labels.position(" EPIDURAL\n"), Some(0));
        assert_eq!(labels.position("ants"), None);
        assert_eq!(labels.diagnostic_indices().collect::<Vec<_>>(), [0, 1, 2, 3, 4]);
        assert_eq!(
            Ok(labels),
            LabelSet::new(HEMORRHAGE_LABELS, ANY_LABEL)
        );
    }

    #[test]
    fn test_aggregate_anywhere() {
        let labels = LabelSet::new(["Any", "A", "B"], "Any").unwrap();
        assert_eq!(labels.aggregate_index(), 0);
        assert_eq!(labels.diagnostic_indices().collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn test_renormalize() {
        let v = LabelVector::checked(vec![80.0, 90.0, 5.0], 3).unwrap();
        let n = v.renormalized();
        assert!(float_eq(n.sum(), 100.0));
        assert!(float_eq(n.scores()[0], 80.0 / 175.0 * 100.0));

        let zero = LabelVector::zeros(3).renormalized();
        assert!(zero.is_zero());
        assert!(zero.scores().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_renormalize_huge_scores() {
        let v = LabelVector::checked(vec![1e308, 1.7e308, 0.0], 3).unwrap();
        assert!(v.sum().is_infinite());

        let n = v.renormalized();
        assert!(!n.is_zero());
        assert!(float_eq(n.sum(), 100.0));
        assert!(float_eq(n.scores()[0], 1.0 / 2.7 * 100.0));
        assert!(float_eq(n.scores()[1], 1.7 / 2.7 * 100.0));
        assert_eq!(n.scores()[2], 0.0);

        let tiny = LabelVector::checked(vec![5e-324, 0.0, 5e-324], 3).unwrap();
        assert!(float_eq(tiny.renormalized().scores()[0], 50.0));
    }

    #[test]
    fn test_checked_rejects_bad_scores() {
        assert!(LabelVector::checked(vec![1.0, 2.0], 3).is_err());
        assert!(LabelVector::checked(vec![1.0, -2.0, 0.0], 3).is_err());
        assert!(LabelVector::checked(vec![1.0, f64::NAN, 0.0], 3).is_err());
        assert!(LabelVector::checked(vec![1.0, f64::INFINITY, 0.0], 3).is_err());
        assert!(LabelVector::checked(vec![0.0, 0.0, 0.0], 3).is_ok());
    }

    #[test]
    fn test_max_excluding() {
        let v = LabelVector::checked(vec![0.3, 0.1, 0.9], 3).unwrap();
        assert_eq!(v.max_excluding(2), Some(0.3));
        assert_eq!(v.max_excluding(0), Some(0.9));
        assert_eq!(LabelVector::zeros(1).max_excluding(0), None);
    }

    #[test]
    fn test_max_assign() {
        let mut acc = LabelVector::checked(vec![80.0, 10.0, 5.0], 3).unwrap();
        acc.max_assign(&LabelVector::checked(vec![30.0, 90.0, 5.0], 3).unwrap());
        assert_eq!(acc.scores(), [80.0, 90.0, 5.0]);
    }
}
