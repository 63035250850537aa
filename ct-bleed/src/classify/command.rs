//! 外部进程分类器.
//!
//! 约定: 切片的 8-bit 灰度图像写入临时 PNG 文件, 然后执行
//! `<program> <args...> --input <file>`. 标准输出最后一个非空行即为结果, 可以是
//!
//! - JSON 数组: 按标签声明顺序的分数, 例如 `[0.1, 0.7, 0.2]`;
//! - JSON 对象: 标签名到分数, 例如 `{"Subdural": 0.7, ...}`;
//! - 其它: 视为单个标签名, 例如 `subdural`.

use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use serde_json::Value;

use super::{RawPrediction, SliceClassifier};
use crate::error::ClassifyError;
use crate::preprocess::NormalizedSlice;

/// 以外部进程实现的分类器.
///
/// 每次调用都启动独立进程并使用独立的临时文件, 因此可以并发调用.
#[derive(Clone, Debug)]
pub struct CommandClassifier {
    program: OsString,
    args: Vec<OsString>,
    input_flag: OsString,
}

impl CommandClassifier {
    /// 以可执行文件 `program` 创建分类器.
    pub fn new<S: Into<OsString>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            input_flag: OsString::from("--input"),
        }
    }

    /// 追加一个位于输入文件参数之前的参数.
    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 追加若干个位于输入文件参数之前的参数.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 修改输入文件参数的标志, 默认为 `--input`.
    pub fn input_flag<S: Into<OsString>>(mut self, flag: S) -> Self {
        self.input_flag = flag.into();
        self
    }

    /// 可执行文件.
    #[inline]
    pub fn program(&self) -> &OsString {
        &self.program
    }
}

impl SliceClassifier for CommandClassifier {
    fn classify(&self, input: &NormalizedSlice) -> Result<RawPrediction, ClassifyError> {
        let unavailable = |what: &str, e: &dyn std::fmt::Display| {
            ClassifyError::Unavailable(format!("slice {}: {what}: {e}", input.index()))
        };

        let png = input
            .encode_png()
            .map_err(|e| unavailable("PNG 编码失败", &e))?;
        let mut file = tempfile::Builder::new()
            .prefix(&format!("slice_{:03}_", input.index()))
            .suffix(".png")
            .tempfile()
            .map_err(|e| unavailable("无法创建临时文件", &e))?;
        file.write_all(&png)
            .and_then(|_| file.flush())
            .map_err(|e| unavailable("无法写入临时文件", &e))?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.input_flag)
            .arg(file.path())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => ClassifyError::Terminated(
                    format!("无法启动 `{}`: {e}", self.program.to_string_lossy()),
                ),
                _ => unavailable("无法启动分类进程", &e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(ClassifyError::Unavailable(format!(
                "slice {}: {}: {reason}",
                input.index(),
                output.status
            )));
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }

    #[inline]
    fn is_concurrent(&self) -> bool {
        true
    }
}

/// 解析分类进程的标准输出.
pub(crate) fn parse_output(stdout: &str) -> Result<RawPrediction, ClassifyError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| !l.is_empty())
        .ok_or_else(|| ClassifyError::Unparseable("分类进程没有输出".to_string()))?;

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| ClassifyError::Unparseable(format!("`{v}` 不是数值")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RawPrediction::Scores),
        Ok(Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| {
                v.as_f64()
                    .map(|s| (k.clone(), s))
                    .ok_or_else(|| ClassifyError::Unparseable(format!("`{k}` 的分数不是数值")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RawPrediction::Named),
        Ok(Value::String(s)) => Ok(RawPrediction::Label(s)),
        _ => Ok(RawPrediction::Label(line.to_string())),
    }
}
