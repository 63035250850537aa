#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 将 3D 头颅 CT 扫描逐切片交给外部分类器, 并把切片级输出融合为体级出血诊断,
//! 同时给出风险最高的切片.
//!
//! 该 crate 只负责流水线本身: 切片提取, 退化切片过滤, 归一化, 分类器适配, 概率融合,
//! 诊断选择, 结果组装. 模型训练, 模型结构, HTTP 服务均不在此处.
//!
//! # 注意
//!
//! 1. 体数据按 (行, 列, 切片) 即 `(H, W, N)` 输入, 内部按 `(N, H, W)` 存储,
//!   以后均按照该模式访问.
//! 2. 切片级的失败 (分类器暂时不可用, 输出无法解析) 不会中止整次运行;
//!   体级和配置级的失败一定会以 `Err` 返回, 不会产生 "看起来完整" 的残缺结果.
//!
//! # 开发计划
//!
//! ### 切片提取与退化切片过滤 ✅
//!
//! 实现位于 `ct-bleed/src/data` 和 `ct-bleed/src/filter.rs`.
//!
//! ### min-max 归一化, 8-bit 渲染, 分类器张量 ✅
//!
//! 实现位于 `ct-bleed/src/data/window.rs` 和 `ct-bleed/src/preprocess.rs`.
//!
//! ### 分类器适配 (闭包 / 外部进程) ✅
//!
//! 外部分类器既可以输出逐标签分数, 也可以只输出一个获胜标签名.
//! 两者都在进入融合之前映射为 `LabelVector`.
//!
//! 实现位于 `ct-bleed/src/classify`.
//!
//! ### 逐元素最大值融合, 最危险切片, 诊断选择 ✅
//!
//! 实现位于 `ct-bleed/src/pipeline`.
//!
//! ### 并行分类 ✅
//!
//! 打开 `rayon` feature, 且分类器声明可并发时生效.

/// 二维索引 (高, 宽).
pub type Idx2d = (usize, usize);

/// 三维索引 (切片, 高, 宽).
pub type Idx3d = (usize, usize, usize);

/// 3D CT 体数据与切片.
mod data;

pub mod classify;
pub mod config;
pub mod consts;
pub mod error;
pub mod filter;
pub mod label;
pub mod pipeline;
pub mod prelude;
pub mod preprocess;

pub use data::{CtVolume, ImgEncodePng, MinMaxWindow, ScanSlice, SliceIter};

pub use error::{InvalidVolumeError, LoadVolumeError};
