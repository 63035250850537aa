//! 对 `ct-bleed` 体数据读取的一层封装. 提供目录解析与 "最新扫描" 的选取.

use chrono::{DateTime, TimeZone};
use ct_bleed::consts::NPZ_VOLUME_KEY;
use ct_bleed::{CtVolume, LoadVolumeError};
use std::env;
use std::ffi::OsStr;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 输入目录的环境变量.
pub const INPUT_DIR_ENV: &str = "CT_BLEED_INPUT_DIR";

/// 结果文件的环境变量.
pub const RESULT_ENV: &str = "CT_BLEED_RESULT";

/// 支持的体数据文件格式.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VolumeFormat {
    /// numpy `.npz` 归档, 体数据位于 `volume` 键下.
    Npz,

    /// `.nii` 或 `.nii.gz`.
    Nifti,
}

impl VolumeFormat {
    /// 按文件名后缀判断格式 (不区分大小写).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().file_name().and_then(OsStr::to_str)?;
        let name = name.to_ascii_lowercase();
        if name.ends_with(".npz") {
            Some(Self::Npz)
        } else if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Some(Self::Nifti)
        } else {
            None
        }
    }
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

fn env_or_home<P: AsRef<Path>, I: IntoIterator<Item = P>>(var: &str, it: I) -> Option<PathBuf> {
    match env::var_os(var) {
        Some(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(it),
    }
}

/// 获取待分诊扫描所在目录.
///
/// 1. 若环境变量 `$CT_BLEED_INPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/inputs`.
///
/// 无法确定用户主目录时返回 `None`.
#[inline]
pub fn input_dir_from_env_or_home() -> Option<PathBuf> {
    env_or_home(INPUT_DIR_ENV, ["inputs"])
}

/// 获取结果文件路径.
///
/// 1. 若环境变量 `$CT_BLEED_RESULT` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/outputs/latest_result.json`.
#[inline]
pub fn result_path_from_env_or_home() -> Option<PathBuf> {
    env_or_home(RESULT_ENV, ["outputs", "latest_result.json"])
}

/// 选出 `dir` 下文件名字典序最大的体数据文件. 目录中没有可识别的文件时返回 `Ok(None)`.
///
/// 只看直接子项, 不递归.
pub fn latest_volume<P: AsRef<Path>>(dir: P) -> io::Result<Option<PathBuf>> {
    let mut latest: Option<PathBuf> = None;
    for entry in dir.as_ref().read_dir()? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() || VolumeFormat::from_path(&path).is_none() {
            continue;
        }
        if latest
            .as_ref()
            .map_or(true, |l| l.file_name() < path.file_name())
        {
            latest = Some(path);
        }
    }
    Ok(latest)
}

/// 导入文件名的时间前缀, 形如 `20240131_235959_`.
///
/// 前缀定长且按时间单调, 因此文件名的字典序就是导入顺序.
pub fn import_prefix<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%Y%m%d_%H%M%S_").to_string()
}

/// 把扫描 `src` 复制进 `dir`, 文件名加上 `at` 的时间前缀. 返回新路径.
///
/// `src` 不是可识别的体数据文件时返回 `ErrorKind::InvalidInput`.
pub fn import_volume<P, Q, Tz>(src: P, dir: Q, at: &DateTime<Tz>) -> io::Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let src = src.as_ref();
    let name = src
        .file_name()
        .filter(|_| VolumeFormat::from_path(src).is_some())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a volume file", src.display()),
            )
        })?;

    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut target = import_prefix(at);
    target.push_str(&name.to_string_lossy());
    let target = dir.join(target);
    fs::copy(src, &target)?;
    log::info!("Imported {} as {}", src.display(), target.display());
    Ok(target)
}

/// 按后缀打开体数据文件.
///
/// npz 归档读取 `volume` 键; 其余后缀返回 `Err(LoadVolumeError::UnsupportedFormat)`.
pub fn open_volume<P: AsRef<Path>>(path: P) -> Result<CtVolume, LoadVolumeError> {
    let path = path.as_ref();
    let volume = match VolumeFormat::from_path(path) {
        Some(VolumeFormat::Npz) => CtVolume::open_npz(path, NPZ_VOLUME_KEY)?,
        Some(VolumeFormat::Nifti) => CtVolume::open_nifti(path)?,
        None => return Err(LoadVolumeError::UnsupportedFormat(path.to_path_buf())),
    };
    let (n, h, w) = volume.shape();
    log::info!("Loaded {} ({h} x {w}, {n} slices)", path.display());
    Ok(volume)
}
