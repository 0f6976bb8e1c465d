// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/bin/simple_continueshot.rs - 连续推理测试代码
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
  classifier::{ClassifierHandle, SignClassifier},
  input::InputWrapper,
  label::LabelTable,
  model::{OnnxModelBuilder, OnnxModelError},
  output::OutputWrapper,
  task::{ContinuousTask, Task},
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
  /// 处理帧数（不指定则处理到输入结束）
  #[arg(long, value_name = "COUNT")]
  pub frame_number: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let model_url = args.model.clone();
  let classifier = ClassifierHandle::spawn(move || {
    let model = OnnxModelBuilder::from_url(&model_url)?.build()?;
    Ok::<_, OnnxModelError>(SignClassifier::new(model, LabelTable::default()))
  });

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  info!("等待模型加载完成...");
  classifier.wait()?;

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .run_task(input, &classifier, output)?;

  Ok(())
}
