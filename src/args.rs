// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/args.rs - 项目参数配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use clap::Parser;
use url::Url;

/// Shouyu 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径 (onnx:/path/to/model.onnx)
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 检测输入来源 (jsonl:/path/to/detections.jsonl；jsonl:- 表示标准输入)
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出 (console: 或 folder:/path/to/records)
  #[arg(long, default_value = "console:", value_name = "OUTPUT")]
  pub output: Url,

  /// 最大处理帧数（0 表示无限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_frames: u64,
}
