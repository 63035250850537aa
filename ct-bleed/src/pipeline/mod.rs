//! 体级分诊流水线.
//!
//! 一次运行的步骤:
//!
//! 1. 按索引升序取出全部切片, 过滤退化切片;
//! 2. 逐张归一化, 渲染 PNG, 交给分类器;
//! 3. 按切片索引顺序融合原始分数, 选出最危险切片;
//! 4. 在体级分数上选出最终诊断, 组装 [`VolumeResult`].
//!
//! 错误策略:
//!
//! - 单张切片分类失败只记录在该切片的结果中, 不影响其余切片;
//! - 全部切片被过滤: [`PipelineError::NoUsableSlices`];
//! - 全部切片分类失败: [`PipelineError::ClassifierUnavailable`];
//! - 分类器永久失效: 立即中止, [`PipelineError::ClassifierTerminated`].

use std::sync::Arc;

use crate::classify::SliceClassifier;
use crate::config::PipelineConfig;
use crate::error::{ClassifyError, PipelineError};
use crate::filter::SliceFilter;
use crate::label::{LabelSet, LabelVector};
use crate::preprocess::SliceNormalizer;
use crate::{CtVolume, ScanSlice};

mod aggregate;
mod diagnosis;
mod result;

#[cfg(feature = "serde")]
mod report;

pub use aggregate::{Aggregate, Aggregator};
pub use diagnosis::select_diagnosis;
pub use result::{SliceOutcome, SliceResult, VolumeResult};

#[cfg(feature = "serde")]
pub use report::{ScoreMap, SliceReport, VolumeLevel, VolumeReport};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 单张切片经过归一化与分类后的中间产物.
struct Processed {
    index: usize,
    image: Vec<u8>,
    prediction: Result<LabelVector, ClassifyError>,
}

/// 分诊流水线. 同一配置与分类器可以反复运行.
pub struct Pipeline<C> {
    config: PipelineConfig,
    labels: Arc<LabelSet>,
    filter: SliceFilter,
    normalizer: SliceNormalizer,
    classifier: C,
}

impl<C: SliceClassifier> Pipeline<C> {
    /// 校验配置并创建流水线.
    pub fn new(config: PipelineConfig, classifier: C) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            labels: Arc::new(config.labels.clone()),
            filter: SliceFilter::new(config.min_std),
            normalizer: SliceNormalizer::new(config.normalize),
            config,
            classifier,
        })
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 标签集合.
    #[inline]
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// 分类器.
    #[inline]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// 对 `volume` 运行一次完整的分诊. `source` 仅用于标识结果.
    ///
    /// 相同输入与确定性分类器下结果完全相同, 与是否并行无关.
    pub fn run(&self, source: &str, volume: &CtVolume) -> Result<VolumeResult, PipelineError> {
        let total = volume.len_z();
        let retained: Vec<ScanSlice<'_>> = volume
            .slice_iter()
            .filter_map(|(_, slice)| self.filter.retain(&slice).then_some(slice))
            .collect();
        let filtered = total - retained.len();
        if retained.is_empty() {
            log::warn!("{source}: all {total} slices are degenerate");
            return Err(PipelineError::NoUsableSlices { total });
        }

        // 结果与 `retained` 同序, 即索引升序.
        let processed = self.process_all(&retained)?;

        let mut aggregator = Aggregator::new(&self.labels);
        let mut slices = Vec::with_capacity(processed.len());
        let mut last_error = None;
        for Processed {
            index,
            image,
            prediction,
        } in processed
        {
            match prediction {
                Ok(raw) => {
                    aggregator.push(index, &raw);
                    slices.push(SliceResult::classified(index, raw, image));
                }
                Err(e) => {
                    log::warn!("{source}: slice {index} not classified: {e}");
                    last_error = Some(e.clone());
                    slices.push(SliceResult::failed(index, e, image));
                }
            }
        }

        let Some(aggregate) = aggregator.finish() else {
            let attempted = slices.len();
            log::error!("{source}: classification failed on all {attempted} slices");
            return Err(PipelineError::ClassifierUnavailable {
                attempted,
                last: last_error
                    .unwrap_or_else(|| ClassifyError::Unavailable("no output".to_string())),
            });
        };

        let diagnosis = if aggregate.is_degenerate() {
            log::warn!("{source}: all raw scores are zero, no diagnosis");
            None
        } else {
            Some(select_diagnosis(&self.labels, &aggregate.normalized)?)
        };

        let result = VolumeResult::assemble(
            source.to_string(),
            total,
            Arc::clone(&self.labels),
            slices,
            aggregate,
            diagnosis,
            filtered,
        );
        log::info!(
            "{source}: {total} slices, {filtered} filtered, {} failed, diagnosis {:?}, most risky slice {}",
            result.failed_count(),
            result.diagnosis(),
            result.most_risky_slice(),
        );
        Ok(result)
    }

    fn process_all(&self, retained: &[ScanSlice<'_>]) -> Result<Vec<Processed>, PipelineError> {
        #[cfg(feature = "rayon")]
        if self.config.parallel && self.classifier.is_concurrent() {
            // 先收集全部结局, 致命错误取索引最小者, 与串行一致.
            let outcomes: Vec<_> = retained.par_iter().map(|s| self.process_one(s)).collect();
            return outcomes.into_iter().collect();
        }
        retained.iter().map(|s| self.process_one(s)).collect()
    }

    fn process_one(&self, slice: &ScanSlice<'_>) -> Result<Processed, PipelineError> {
        let index = slice.index();
        let input = self
            .normalizer
            .normalize(slice, self.classifier.input_kind());
        let image = input.encode_png().map_err(|e| PipelineError::Render {
            index,
            reason: e.to_string(),
        })?;
        let prediction = self
            .classifier
            .classify(&input)
            .and_then(|raw| raw.into_label_vector(&self.labels));
        match prediction {
            Err(e) if e.is_terminal() => {
                log::error!("slice {index}: classifier terminated: {e}");
                Err(PipelineError::ClassifierTerminated { index, source: e })
            }
            prediction => Ok(Processed {
                index,
                image,
                prediction,
            }),
        }
    }
}
