//! 命令行参数.

use clap::{ArgAction, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// 头颅 CT 出血分诊
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 日志详细程度, 可重复 (`-v` 为 debug, `-vv` 为 trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// 子命令
#[derive(Subcommand, Debug)]
pub enum Command {
    /// 分诊一份扫描并保存结果
    Classify {
        /// 体数据文件 (.npz / .nii / .nii.gz). 缺省时取输入目录下文件名最大的扫描
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// JSON 格式的流水线配置
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// 结果文件
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// 分类器命令, 每张切片以 `<cmd...> --input <png>` 调用
        #[arg(last = true, required = true, value_name = "CMD")]
        cmd: Vec<OsString>,
    },

    /// 分类单张二维图像, 不保存结果
    ClassifyImage {
        /// 图像文件 (PNG, JPEG 等)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON 格式的流水线配置
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// 分类器命令, 以 `<cmd...> --input <png>` 调用
        #[arg(last = true, required = true, value_name = "CMD")]
        cmd: Vec<OsString>,
    },

    /// 以时间前缀把扫描复制进输入目录
    Import {
        /// 体数据文件 (.npz / .nii / .nii.gz)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 输入目录. 缺省时为 `$CT_BLEED_INPUT_DIR` 或 `~/dataset/inputs`
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// 显示最近一次结果
    Show {
        /// 结果文件
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// 同时列出逐切片结果
        #[arg(long)]
        slices: bool,
    },

    /// 服务存活检查
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classify() {
        let cli = Cli::try_parse_from([
            "triage", "-v", "classify", "--input", "a.npz", "--", "python", "infer.py",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Classify { input, cmd, config, .. } = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(input, Some(PathBuf::from("a.npz")));
        assert!(config.is_none());
        assert_eq!(cmd, [OsString::from("python"), OsString::from("infer.py")]);
    }

    #[test]
    fn test_parse_image_and_import() {
        let cli = Cli::try_parse_from(["triage", "classify-image", "x.png", "--", "./model"])
            .unwrap();
        let Command::ClassifyImage { file, cmd, .. } = cli.command else {
            panic!("expected classify-image");
        };
        assert_eq!(file, PathBuf::from("x.png"));
        assert_eq!(cmd, [OsString::from("./model")]);

        let cli = Cli::try_parse_from(["triage", "import", "scan.npz", "--dir", "in"]).unwrap();
        let Command::Import { file, dir } = cli.command else {
            panic!("expected import");
        };
        assert_eq!(file, PathBuf::from("scan.npz"));
        assert_eq!(dir, Some(PathBuf::from("in")));
    }

    #[test]
    fn test_classify_needs_command() {
        assert!(Cli::try_parse_from(["triage", "classify"]).is_err());
    }
}
