//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{CtVolume, ImgEncodePng, MinMaxWindow, ScanSlice, SliceIter};

pub use crate::classify::{CommandClassifier, FnClassifier, RawPrediction, SliceClassifier};
pub use crate::config::{NormalizeConfig, PipelineConfig};
pub use crate::error::{
    ClassifyError, InvalidVolumeError, LabelSetError, LoadVolumeError, PipelineError,
};
pub use crate::filter::{SliceFilter, Verdict};
pub use crate::label::{LabelSet, LabelVector};
pub use crate::pipeline::{Pipeline, SliceOutcome, SliceResult, VolumeResult};
pub use crate::preprocess::{InputKind, NormalizedSlice, SliceNormalizer};

#[cfg(feature = "serde")]
pub use crate::pipeline::{ScoreMap, SliceReport, VolumeReport};

pub use crate::consts::{ANY_LABEL, HEMORRHAGE_LABELS, NPZ_VOLUME_KEY};
