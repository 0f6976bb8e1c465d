// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/main.rs - 项目主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use std::thread;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};

use shouyu::{
  FromUrl,
  classifier::{Classify, ClassifierHandle, SignClassifier},
  feature::FeatureEncoder,
  input::{InputWrapper, LatestSlot},
  label::{LabelTable, NO_SIGN_CLASS},
  model::{OnnxModelBuilder, OnnxModelError},
  output::{OutputWrapper, Render},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  // 模型在后台加载，与输入输出的初始化并行
  let model_url = args.model.clone();
  let classifier = ClassifierHandle::spawn(move || {
    let model = OnnxModelBuilder::from_url(&model_url)?.build()?;
    Ok::<_, OnnxModelError>(SignClassifier::new(model, LabelTable::default()))
  });

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  info!("等待模型加载完成...");
  classifier.wait()?;

  // 读取线程按检测器的节奏发布帧，主循环只消费最新一帧，
  // 分类落后时直接丢弃过期帧
  let slot = LatestSlot::new();
  let publisher = slot.clone();
  // 读取线程可能阻塞在标准输入上，主流程不等待它结束
  let _reader = thread::spawn(move || {
    for frame in input {
      match frame {
        Ok(frame) => publisher.publish(frame),
        Err(e) => {
          error!("输入错误: {}", e);
          break;
        }
      }
    }
    publisher.close();
  });

  info!("开始处理...");
  let encoder = FeatureEncoder;
  let mut frame_count = 0u64;
  let mut recognized = 0u64;

  while let Some(frame) = slot.take() {
    if args.max_frames > 0 && frame_count >= args.max_frames {
      info!("已达到最大帧数限制: {}", args.max_frames);
      break;
    }

    let now = Instant::now();
    let features = encoder.encode(&frame)?;
    let prediction = classifier.classify(&features)?;
    output.render_result(&frame, &prediction)?;

    if prediction.class_id != NO_SIGN_CLASS {
      recognized += 1;
    }
    frame_count += 1;
    debug!("帧 {} 推理完成，耗时: {:.2?}", frame_count, now.elapsed());
  }

  slot.close();

  info!(
    "处理完成! 总帧数: {}, 识别帧数: {}, 丢弃帧数: {}",
    frame_count,
    recognized,
    slot.dropped()
  );

  Ok(())
}
