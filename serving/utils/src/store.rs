//! 最近一次分诊结果的持久化.

use ct_bleed::pipeline::VolumeReport;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 结果读写错误.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 文件读写失败.
    #[error("无法访问 {}: {source}", path.display())]
    Io {
        /// 出错的路径.
        path: PathBuf,
        /// 底层错误.
        source: io::Error,
    },

    /// JSON 编解码失败.
    #[error("{} 不是合法的分诊结果: {source}", path.display())]
    Json {
        /// 出错的路径.
        path: PathBuf,
        /// 底层错误.
        source: serde_json::Error,
    },
}

/// 单文件结果存储. 每次保存覆盖上一次的结果.
#[derive(Clone, Debug)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// 以 `path` 作为结果文件.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// 以 `$CT_BLEED_RESULT` 或 `$HOME/dataset/outputs/latest_result.json` 作为结果文件.
    pub fn from_env_or_home() -> Option<Self> {
        crate::loader::result_path_from_env_or_home().map(Self::new)
    }

    /// 结果文件路径.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// 保存 `report`. 先写入同目录下的临时文件再重命名, 读者不会看到写了一半的文件.
    pub fn save(&self, report: &VolumeReport) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;

        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_err(e))?;
        let mut w = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut w, report).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        w.flush().map_err(|e| self.io_err(e))?;
        drop(w);

        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;
        log::info!("Result saved to {}", self.path.display());
        Ok(())
    }

    /// 读取最近一次结果. 尚无结果时返回 `Ok(None)`.
    pub fn load(&self) -> Result<Option<VolumeReport>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })
    }
}
