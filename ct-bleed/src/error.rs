//! 运行时错误.
//!
//! 错误分为三层:
//!
//! 1. 切片级: [`ClassifyError::Unavailable`], [`ClassifyError::Unparseable`].
//!   只影响单张切片, 记录后继续运行;
//! 2. 体级: [`InvalidVolumeError`], 以及 [`PipelineError`] 中除配置类以外的变体.
//!   中止本次运行;
//! 3. 配置级: [`LabelSetError`], [`PipelineError::InvalidParameter`]. 应在启动时暴露.

use std::path::PathBuf;

/// 体数据不合法. 在任何切片工作开始之前返回.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidVolumeError {
    /// 输入不是三维数组.
    #[error("体数据必须是三维数组, 但得到了 {ndim} 维")]
    NotThreeDimensional {
        /// 实际维数.
        ndim: usize,
    },

    /// 切片个数为 0, 或切片本身为空.
    #[error("体数据为空, 形状 (H, W, N) = {shape:?}")]
    Empty {
        /// 按 `(H, W, N)` 报告的形状.
        shape: (usize, usize, usize),
    },
}

/// 从磁盘加载体数据时的错误.
#[derive(Debug, thiserror::Error)]
pub enum LoadVolumeError {
    /// 底层 I/O 错误.
    #[error("无法读取 `{path}`: {source}")]
    Io {
        /// 出错的文件.
        path: PathBuf,
        /// 原始错误.
        source: std::io::Error,
    },

    /// nifti 解码错误.
    #[error("nifti 解码失败: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// npz 解码错误.
    #[error("npz 条目 `{key}` 读取失败: {source}")]
    Npz {
        /// 条目名.
        key: String,
        /// 原始错误.
        source: ndarray_npy::ReadNpzError,
    },

    /// npz 归档中没有所需条目.
    #[error("npz 中没有条目 `{key}`, 现有条目: {available:?}")]
    MissingEntry {
        /// 所需条目名.
        key: String,
        /// 归档中实际存在的条目.
        available: Vec<String>,
    },

    /// 图像解码错误.
    #[error("图像解码失败: {0}")]
    Image(#[from] image::ImageError),

    /// 文件扩展名无法识别.
    #[error("不支持的体数据格式: `{0}`")]
    UnsupportedFormat(PathBuf),

    /// 文件解码成功, 但体数据不合法.
    #[error(transparent)]
    Invalid(#[from] InvalidVolumeError),
}

/// 标签集合配置错误.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LabelSetError {
    /// 没有任何标签.
    #[error("标签集合为空")]
    Empty,

    /// 标签名重复 (不区分 ASCII 大小写).
    #[error("标签 `{0}` 重复")]
    Duplicate(String),

    /// 指定的聚合标签不在集合中.
    #[error("聚合标签 `{0}` 不在标签集合中")]
    MissingAggregate(String),

    /// 除聚合标签外没有其它标签, 无法选择诊断.
    #[error("除聚合标签 `{0}` 外没有可供诊断的标签")]
    OnlyAggregate(String),
}

/// 单张切片的分类错误.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    /// 分类器暂时不可用 (进程非零退出, 超时等). 该切片被记录并排除.
    #[error("分类器不可用: {0}")]
    Unavailable(String),

    /// 分类器输出无法按标签集合解析. 该切片被记录并排除.
    #[error("分类器输出无法解析: {0}")]
    Unparseable(String),

    /// 分类器已永久失效. 整次运行中止.
    #[error("分类器已终止: {0}")]
    Terminated(String),
}

impl ClassifyError {
    /// 该错误是否应中止整次运行?
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

/// 流水线的致命错误. 出现这些错误时不会产生 `VolumeResult`.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// 输入体数据不合法.
    #[error(transparent)]
    InvalidVolume(#[from] InvalidVolumeError),

    /// 配置错误.
    #[error("配置错误: {0}")]
    Config(#[from] LabelSetError),

    /// 数值配置项不合法.
    #[error("配置项 `{name}` 的取值 {value} 不合法")]
    InvalidParameter {
        /// 配置项名.
        name: &'static str,
        /// 实际取值.
        value: f64,
    },

    /// 全部切片都是退化切片, 没有可分类的内容.
    #[error("{total} 张切片全部被过滤, 没有可用切片")]
    NoUsableSlices {
        /// 体数据切片总数.
        total: usize,
    },

    /// 全部保留切片的分类都失败了.
    #[error("{attempted} 张切片的分类全部失败, 最后一次错误: {last}")]
    ClassifierUnavailable {
        /// 尝试分类的切片数.
        attempted: usize,
        /// 最后一次的切片级错误.
        last: ClassifyError,
    },

    /// 切片渲染为 PNG 失败.
    #[error("切片 {index} 渲染失败: {reason}")]
    Render {
        /// 出错的切片索引.
        index: usize,
        /// 原始错误信息.
        reason: String,
    },

    /// 分类器永久失效.
    #[error("切片 {index} 分类时分类器终止: {source}")]
    ClassifierTerminated {
        /// 出错的切片索引.
        index: usize,
        /// 原始错误.
        source: ClassifyError,
    },
}
