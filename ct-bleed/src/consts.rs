//! 通用常量. 这些值只作为 [`crate::config::PipelineConfig`] 的默认值使用,
//! 流水线逻辑本身从不直接读取它们.

/// 颅内出血分类的标签名, 按声明顺序排列. 最后一个是聚合标签.
pub const HEMORRHAGE_LABELS: [&str; 6] = [
    "Epidural",
    "Intraparenchymal",
    "Intraventricular",
    "Subarachnoid",
    "Subdural",
    "Any",
];

/// 聚合 ("任意类型出血") 标签名. 它不参与最终诊断的选择.
pub const ANY_LABEL: &str = "Any";

/// 切片标准差低于该值时视为退化切片 (全背景, 全零填充), 不参与分类.
pub const DEFAULT_MIN_STD: f64 = 1e-3;

/// min-max 归一化分母中的平滑项, 防止均匀切片除零.
pub const DEFAULT_NORM_EPS: f32 = 1e-6;

/// 分类器张量的边长 (像素).
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// 分类器张量每个通道的标准化均值.
pub const DEFAULT_CHANNEL_MEAN: [f32; 3] = [0.485; 3];

/// 分类器张量每个通道的标准化标准差.
pub const DEFAULT_CHANNEL_STD: [f32; 3] = [0.229; 3];

/// 融合后的体级分数之和.
pub const SCORE_TOTAL: f64 = 100.0;

/// npz 归档中体数据的默认条目名.
pub const NPZ_VOLUME_KEY: &str = "volume";
