//! 子命令的实际运行.

use anyhow::{anyhow, bail, Context, Result};
use ct_bleed::classify::{CommandClassifier, SliceClassifier};
use ct_bleed::config::PipelineConfig;
use ct_bleed::pipeline::{select_diagnosis, Pipeline, ScoreMap, VolumeReport};
use ct_bleed::preprocess::SliceNormalizer;
use ct_bleed::CtVolume;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use utils::loader;
use utils::store::ResultStore;

fn resolve_store(store: Option<PathBuf>) -> Result<ResultStore> {
    match store {
        Some(p) => Ok(ResultStore::new(p)),
        None => ResultStore::from_env_or_home()
            .ok_or_else(|| anyhow!("cannot locate home directory, pass --store")),
    }
}

fn resolve_input(input: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = input {
        return Ok(p);
    }
    let dir = loader::input_dir_from_env_or_home()
        .ok_or_else(|| anyhow!("cannot locate home directory, pass --input"))?;
    loader::latest_volume(&dir)
        .with_context(|| format!("cannot list {}", dir.display()))?
        .ok_or_else(|| anyhow!("no volume file under {}", dir.display()))
}

/// 读取 JSON 配置. 缺省时使用出血分诊预设.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// 分诊一份扫描, 保存并返回结果.
pub fn classify(
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    store: Option<PathBuf>,
    cmd: Vec<OsString>,
) -> Result<VolumeReport> {
    let classifier = command_classifier(&cmd)?;
    let config = load_config(config.as_deref())?;
    let pipeline = Pipeline::new(config, classifier).context("invalid pipeline config")?;
    let store = resolve_store(store)?;

    let path = resolve_input(input)?;
    let volume = loader::open_volume(&path)
        .with_context(|| format!("cannot load {}", path.display()))?;
    let source = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let result = pipeline
        .run(&source, &volume)
        .with_context(|| format!("triage of {source} failed"))?;
    let report = VolumeReport::from(&result);
    store.save(&report)?;
    Ok(report)
}

/// 单张图像的分类结果.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageVerdict {
    /// 总和为 100 的分数; 分类器全给 0 时全为 0.
    pub scores: ScoreMap,

    /// 得分最高的非聚合标签. 分数全为 0 时为 `None`.
    pub diagnosis: Option<String>,
}

fn command_classifier(cmd: &[OsString]) -> Result<CommandClassifier> {
    let Some((program, args)) = cmd.split_first() else {
        bail!("missing classifier command");
    };
    Ok(CommandClassifier::new(program.clone()).args(args.iter().cloned()))
}

/// 分类单张二维图像. 不经过过滤, 也不保存结果.
pub fn classify_image(
    file: &Path,
    config: Option<PathBuf>,
    cmd: Vec<OsString>,
) -> Result<ImageVerdict> {
    let classifier = command_classifier(&cmd)?;
    let config = load_config(config.as_deref())?;
    config.validate().context("invalid pipeline config")?;

    let image = CtVolume::open_image(file)
        .with_context(|| format!("cannot load {}", file.display()))?;
    let input =
        SliceNormalizer::new(config.normalize).normalize(&image.slice_at(0), classifier.input_kind());
    let scores = classifier
        .classify(&input)
        .and_then(|raw| raw.into_label_vector(&config.labels))
        .with_context(|| format!("classification of {} failed", file.display()))?
        .renormalized();

    let diagnosis = if scores.is_zero() {
        None
    } else {
        let pos = select_diagnosis(&config.labels, &scores)?;
        config.labels.name(pos).map(str::to_string)
    };
    Ok(ImageVerdict {
        scores: ScoreMap::new(&config.labels, &scores),
        diagnosis,
    })
}

/// 把扫描复制进输入目录, 返回新路径.
pub fn import(file: &Path, dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match dir {
        Some(d) => d,
        None => loader::input_dir_from_env_or_home()
            .ok_or_else(|| anyhow!("cannot locate home directory, pass --dir"))?,
    };
    loader::import_volume(file, &dir, &chrono::Local::now())
        .with_context(|| format!("cannot import {} into {}", file.display(), dir.display()))
}

/// 读取最近一次结果并输出摘要.
pub fn show<W: io::Write>(store: Option<PathBuf>, slices: bool, w: &mut W) -> Result<()> {
    let store = resolve_store(store)?;
    match store.load()? {
        Some(report) => crate::result::describe_into(&report, slices, w)?,
        None => writeln!(w, "No result yet at {}", store.path().display())?,
    }
    Ok(())
}
