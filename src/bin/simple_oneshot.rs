// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/bin/simple_oneshot.rs - 单帧推理测试代码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use shouyu::{
  FromUrl,
  classifier::SignClassifier,
  input::JsonLinesInput,
  label::LabelTable,
  model::OnnxModelBuilder,
  output::ConsoleOutput,
  task::{OneShotTask, Task},
};

/// Shouyu 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 检测输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出
  #[arg(long, default_value = "console:", value_name = "OUTPUT")]
  pub output: Url,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = JsonLinesInput::from_url(&args.input)?;
  let model = OnnxModelBuilder::from_url(&args.model)?.build()?;
  let classifier = SignClassifier::new(model, LabelTable::default());
  let output = ConsoleOutput::from_url(&args.output)?;

  OneShotTask.run_task(input, &classifier, output)?;

  Ok(())
}
