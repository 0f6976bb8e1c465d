// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Utc};
use thiserror::Error;

use crate::classifier::Prediction;
use crate::label::NO_SIGN_CLASS;
use crate::landmark::FrameDetections;
use crate::output::Render;
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
}

/// 目录记录输出
///
/// 把识别结果按 `年/月/日.jsonl` 追加到记录目录，默认只记录
/// 识别出手语的帧，带 `?always` 查询参数时全部记录。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counters: Arc<Mutex<u64>>,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = url.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(url.path()),
      frame_counters: Arc::new(Mutex::new(0)),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u64 {
    let mut counter = self.frame_counters.lock().unwrap();
    let id = *counter + 1;
    *counter = id;
    id
  }
}

impl Render<FrameDetections, Prediction> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(
    &self,
    frame: &FrameDetections,
    result: &Prediction,
  ) -> Result<(), Self::Error> {
    if !self.always && result.class_id == NO_SIGN_CLASS {
      return Ok(());
    }

    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }
    let path = directory.join(format!("{:02}.jsonl", now.day()));

    let record = serde_json::json!({
      "time": now.to_rfc3339(),
      "frame": self.frame_id(),
      "class": result.class_id,
      "score": result.score,
      "label": result.label,
      "pose": frame.pose.is_some(),
      "left_hand": frame.left_hand.is_some(),
      "right_hand": frame.right_hand.is_some(),
    });

    let mut file = std::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)?;
    writeln!(file, "{}", record)?;

    Ok(())
  }
}
