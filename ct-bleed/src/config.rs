//! 流水线配置.
//!
//! 标签集合, 过滤阈值, 归一化常量都显式地随每次调用传入, 而不是写成模块级常量,
//! 以便同一进程内并存多套分类体系或阈值.
//!
//! 打开 `serde` feature 后, 配置可以从 JSON 反序列化. 缺省字段取默认值:
//!
//! ```json
//! {
//!     "labels": { "names": ["A", "B", "Any"], "aggregate": "Any" },
//!     "min_std": 0.001,
//!     "normalize": { "input_size": 224 },
//!     "parallel": true
//! }
//! ```

use crate::consts::*;
use crate::error::PipelineError;
use crate::label::LabelSet;

/// 切片归一化与分类器张量的参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NormalizeConfig {
    /// min-max 归一化分母中的平滑项.
    pub eps: f32,

    /// 分类器张量的边长.
    pub input_size: u32,

    /// 分类器张量每个通道的均值.
    pub mean: [f32; 3],

    /// 分类器张量每个通道的标准差.
    pub std: [f32; 3],
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_NORM_EPS,
            input_size: DEFAULT_INPUT_SIZE,
            mean: DEFAULT_CHANNEL_MEAN,
            std: DEFAULT_CHANNEL_STD,
        }
    }
}

impl NormalizeConfig {
    /// 检查参数是否合法.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(invalid("normalize.eps", self.eps as f64));
        }
        if self.input_size == 0 {
            return Err(invalid("normalize.input_size", 0.0));
        }
        if let Some(m) = self.mean.iter().find(|m| !m.is_finite()) {
            return Err(invalid("normalize.mean", *m as f64));
        }
        if let Some(s) = self.std.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(invalid("normalize.std", *s as f64));
        }
        Ok(())
    }
}

/// 一次流水线调用的全部配置.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// 诊断标签集合.
    pub labels: LabelSet,

    /// 切片标准差低于该值时被过滤.
    pub min_std: f64,

    /// 归一化参数.
    pub normalize: NormalizeConfig,

    /// 是否允许并行分类. 仅在 `rayon` feature 打开且分类器声明可并发时生效.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            labels: LabelSet::hemorrhage(),
            min_std: DEFAULT_MIN_STD,
            normalize: NormalizeConfig::default(),
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// 以给定标签集合和默认参数构建配置.
    #[inline]
    pub fn with_labels(labels: LabelSet) -> Self {
        Self {
            labels,
            ..Self::default()
        }
    }

    /// 检查参数是否合法. 标签集合在构造时已经校验过.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.min_std.is_finite() || self.min_std < 0.0 {
            return Err(invalid("min_std", self.min_std));
        }
        self.normalize.validate()
    }
}

#[inline]
fn invalid(name: &'static str, value: f64) -> PipelineError {
    PipelineError::InvalidParameter { name, value }
}
