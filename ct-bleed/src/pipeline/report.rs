//! 体级结果的 JSON 记录.
//!
//! 记录是服务层持久化与展示的唯一格式. 标签分数以 JSON 对象表示,
//! 键的顺序与标签集合的声明顺序一致.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::result::{SliceResult, VolumeResult};
use crate::label::{LabelSet, LabelVector};

/// 保持插入顺序的 `标签名 -> 分数` 映射.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreMap(Vec<(String, f64)>);

impl ScoreMap {
    /// 以 `labels` 的声明顺序构建.
    pub fn new(labels: &LabelSet, scores: &LabelVector) -> Self {
        Self(
            scores
                .labeled(labels)
                .map(|(name, s)| (name.to_string(), s))
                .collect(),
        )
    }

    /// 按名称查询分数 (区分大小写).
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    /// 依次访问 `(标签名, 分数)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// 标签数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ScoreMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct ScoreMapVisitor;

impl<'de> Visitor<'de> for ScoreMapVisitor {
    type Value = ScoreMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of label names to scores")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ScoreMap, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, f64>()? {
            entries.push((k, v));
        }
        Ok(ScoreMap(entries))
    }
}

impl<'de> Deserialize<'de> for ScoreMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ScoreMapVisitor)
    }
}

/// 体级摘要.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeLevel {
    /// 总和为 100 (或全零) 的体级分数.
    pub probabilities: ScoreMap,

    /// 逐元素最大值.
    pub raw_scores: ScoreMap,

    /// 最终诊断. 融合结果退化时为 `null`.
    pub final_diagnosis: Option<String>,

    /// 原始分数是否全为 0.
    pub degenerate: bool,
}

/// 单张保留切片的记录.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceReport {
    /// 切片索引.
    pub slice_index: usize,

    /// 总和为 100 的分数. 分类失败时为 `null`.
    pub probabilities: Option<ScoreMap>,

    /// 原始分数. 分类失败时为 `null`.
    pub raw_scores: Option<ScoreMap>,

    /// base64 编码的 PNG 渲染.
    pub image_base64: String,

    /// 分类错误信息.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SliceReport {
    fn new(labels: &LabelSet, slice: &SliceResult) -> Self {
        Self {
            slice_index: slice.index(),
            probabilities: slice.scores().map(|s| ScoreMap::new(labels, s)),
            raw_scores: slice.raw_scores().map(|s| ScoreMap::new(labels, s)),
            image_base64: STANDARD.encode(slice.image_png()),
            error: slice.error().map(ToString::to_string),
        }
    }

    /// 解码 PNG 字节.
    pub fn decode_image(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.image_base64)
    }
}

/// 一次运行的完整记录.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeReport {
    /// 数据来源.
    pub source: String,

    /// 切片总数.
    pub num_slices: usize,

    /// 体级摘要.
    pub volume_level: VolumeLevel,

    /// 最危险切片的索引.
    pub most_risky_slice_index: usize,

    /// 被过滤的切片数.
    pub filtered_slices: usize,

    /// 分类失败的切片数.
    pub failed_slices: usize,

    /// 保留切片的记录, 按索引升序.
    pub slice_level: Vec<SliceReport>,
}

impl VolumeReport {
    /// 查找索引为 `index` 的切片记录.
    pub fn slice(&self, index: usize) -> Option<&SliceReport> {
        self.slice_level
            .binary_search_by_key(&index, |s| s.slice_index)
            .ok()
            .map(|i| &self.slice_level[i])
    }
}

impl From<&VolumeResult> for VolumeReport {
    fn from(result: &VolumeResult) -> Self {
        let labels = result.labels();
        Self {
            source: result.source().to_string(),
            num_slices: result.slice_count(),
            volume_level: VolumeLevel {
                probabilities: ScoreMap::new(labels, result.scores()),
                raw_scores: ScoreMap::new(labels, result.raw_scores()),
                final_diagnosis: result.diagnosis().map(str::to_string),
                degenerate: result.is_degenerate(),
            },
            most_risky_slice_index: result.most_risky_slice(),
            filtered_slices: result.filtered_count(),
            failed_slices: result.failed_count(),
            slice_level: result
                .slices()
                .iter()
                .map(|s| SliceReport::new(labels, s))
                .collect(),
        }
    }
}
