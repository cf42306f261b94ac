//! 命令行参数

use crate::models::{SortDirection, SortField};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "resume-upload")]
#[command(about = "批量上传简历并轮询分类结果", long_about = None)]
pub struct Cli {
    /// 显示详细日志（覆盖配置文件）
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// 子命令
#[derive(Debug, Subcommand)]
pub enum Command {
    /// 上传文件（目录展开为其中的文件）并等待处理结束
    Submit {
        /// 文件或目录
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// 列出已保存的分类结果
    List {
        /// 排序字段
        #[arg(value_enum, default_value_t = SortField::Timestamp)]
        field: SortField,

        /// 排序方向
        #[arg(value_enum, default_value_t = SortDirection::Desc)]
        direction: SortDirection,
    },
    /// 删除分类结果
    Delete {
        /// 结果 id
        #[arg(required = true)]
        ids: Vec<String>,
    },
}
