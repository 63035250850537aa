//! npz 归档中的体数据读取.

use std::fs::File;
use std::path::Path;

use ndarray::{ArrayD, IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpzError};

use crate::error::LoadVolumeError;

/// 依次尝试的元素类型. 与 `try_read` 中的分支保持一致.
const ELEM_TYPES: usize = 4;

/// 读取 `path` 中名为 `key` (或 `{key}.npy`) 的数组, 并转换为 `f32`.
pub(super) fn read_volume(path: &Path, key: &str) -> Result<ArrayD<f32>, LoadVolumeError> {
    let file = File::open(path).map_err(|source| LoadVolumeError::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut npz = NpzReader::new(file).map_err(|source| LoadVolumeError::Npz {
        key: key.to_string(),
        source,
    })?;

    let names = npz.names().map_err(|source| LoadVolumeError::Npz {
        key: key.to_string(),
        source,
    })?;
    let dotted = format!("{key}.npy");
    let Some(entry) = names
        .iter()
        .find(|n| n.as_str() == key || n.as_str() == dotted)
        .cloned()
    else {
        return Err(LoadVolumeError::MissingEntry {
            key: key.to_string(),
            available: names,
        });
    };

    // 全部类型都不匹配时报告第一次 (f32) 的错误.
    let first = match try_read(&mut npz, &entry, 0) {
        Ok(data) => return Ok(data),
        Err(e) => e,
    };
    for kind in 1..ELEM_TYPES {
        if let Ok(data) = try_read(&mut npz, &entry, kind) {
            return Ok(data);
        }
    }
    Err(LoadVolumeError::Npz {
        key: key.to_string(),
        source: first,
    })
}

/// 以第 `kind` 种元素类型读取条目.
fn try_read(
    npz: &mut NpzReader<File>,
    name: &str,
    kind: usize,
) -> Result<ArrayD<f32>, ReadNpzError> {
    match kind {
        0 => npz.by_name::<OwnedRepr<f32>, IxDyn>(name),
        1 => Ok(npz
            .by_name::<OwnedRepr<f64>, IxDyn>(name)?
            .mapv(|v| v as f32)),
        2 => Ok(npz
            .by_name::<OwnedRepr<i16>, IxDyn>(name)?
            .mapv(f32::from)),
        _ => Ok(npz
            .by_name::<OwnedRepr<u8>, IxDyn>(name)?
            .mapv(f32::from)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use ndarray_npy::NpzWriter;

    fn write_npz<T: ndarray_npy::WritableElement>(path: &Path, name: &str, data: &Array3<T>) {
        let mut npz = NpzWriter::new(File::create(path).unwrap());
        npz.add_array(name, data).unwrap();
        npz.finish().unwrap();
    }

    #[test]
    fn test_read_volume_f64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npz");
        let data = Array3::from_shape_fn((3, 2, 5), |(h, w, n)| (h + w + n) as f64);
        write_npz(&path, "volume", &data);

        let read = read_volume(&path, "volume").unwrap();
        assert_eq!(read.shape(), [3, 2, 5]);
        assert_eq!(read[[2, 1, 4]], 7.0);
    }

    #[test]
    fn test_read_volume_i16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npz");
        let data = Array3::from_shape_fn((2, 2, 2), |(h, _, _)| -1000i16 + h as i16);
        write_npz(&path, "volume", &data);

        let read = read_volume(&path, "volume").unwrap();
        assert_eq!(read[[1, 0, 0]], -999.0);
    }

    #[test]
    fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npz");
        write_npz(&path, "mask", &Array3::<u8>::zeros((2, 2, 2)));
        match read_volume(&path, "volume") {
            Err(LoadVolumeError::MissingEntry { key, available }) => {
                assert_eq!(key, "volume");
                assert_eq!(available, ["mask.npy"]);
            }
            r => panic!("unexpected result: {r:?}"),
        }
    }

    #[test]
    fn test_unsupported_elem_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npz");
        write_npz(&path, "volume", &Array3::<i64>::zeros((2, 2, 2)));

        let err = read_volume(&path, "volume").unwrap_err();
        let LoadVolumeError::Npz { source, .. } = err else {
            panic!("unexpected error: {err}");
        };
        // 第一次尝试的是 f32.
        let f32_err = NpzReader::new(File::open(&path).unwrap())
            .unwrap()
            .by_name::<OwnedRepr<f32>, IxDyn>("volume.npy")
            .unwrap_err();
        assert_eq!(source.to_string(), f32_err.to_string());
    }
}
