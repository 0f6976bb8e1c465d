// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/input/jsonl.rs - JSON Lines 检测输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::fs::File;
use std::io::{BufRead, BufReader};

use thiserror::Error;
use tracing::error;
use url::Url;

use crate::landmark::FrameDetections;
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum JsonLinesInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测数据解析错误 (第 {line} 行): {source}")]
  ParseError {
    line: u64,
    #[source]
    source: serde_json::Error,
  },
}

const JSONL_SCHEME: &str = "jsonl";

/// JSON Lines 检测输入
///
/// 每行一帧检测结果，由外部姿态检测器产出。路径 `-` 表示
/// 从标准输入读取，用于与检测器进程直接拼接。
pub struct JsonLinesInput {
  reader: Box<dyn BufRead + Send>,
  line: u64,
}

impl std::fmt::Debug for JsonLinesInput {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("JsonLinesInput")
      .field("line", &self.line)
      .finish_non_exhaustive()
  }
}

impl FromUrlWithScheme for JsonLinesInput {
  const SCHEME: &'static str = JSONL_SCHEME;
}

impl FromUrl for JsonLinesInput {
  type Error = JsonLinesInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != JSONL_SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        JSONL_SCHEME,
        url.scheme()
      );
      return Err(JsonLinesInputError::SchemaMismatch);
    }

    let path = url.path();
    let reader: Box<dyn BufRead + Send> = if path == "-" || path.is_empty() {
      Box::new(BufReader::new(std::io::stdin()))
    } else {
      Box::new(BufReader::new(File::open(path)?))
    };

    Ok(JsonLinesInput { reader, line: 0 })
  }
}

impl JsonLinesInput {
  pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
    JsonLinesInput {
      reader: Box::new(reader),
      line: 0,
    }
  }
}

impl Iterator for JsonLinesInput {
  type Item = Result<FrameDetections, JsonLinesInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let mut buffer = String::new();
      self.line += 1;
      match self.reader.read_line(&mut buffer) {
        Ok(0) => return None,
        Ok(_) => {
          let trimmed = buffer.trim();
          if trimmed.is_empty() {
            continue;
          }
          return Some(serde_json::from_str(trimmed).map_err(|source| {
            JsonLinesInputError::ParseError {
              line: self.line,
              source,
            }
          }));
        }
        Err(e) => return Some(Err(e.into())),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;

  #[test]
  fn reads_one_frame_per_line() {
    let data = "{\"poseLandmarks\": []}\n\n{}\n";
    let mut input = JsonLinesInput::from_reader(Cursor::new(data));

    let first = input.next().unwrap().unwrap();
    assert_eq!(first.pose, Some(vec![]));

    // 空行被跳过
    let second = input.next().unwrap().unwrap();
    assert!(second.is_empty());

    assert!(input.next().is_none());
  }

  #[test]
  fn malformed_line_reports_line_number() {
    let data = "{}\nnot json\n";
    let mut input = JsonLinesInput::from_reader(Cursor::new(data));

    assert!(input.next().unwrap().is_ok());
    let err = input.next().unwrap().unwrap_err();
    assert!(matches!(err, JsonLinesInputError::ParseError { line: 2, .. }));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("image:/tmp/detections.jsonl").unwrap();
    let err = JsonLinesInput::from_url(&url).unwrap_err();
    assert!(matches!(err, JsonLinesInputError::SchemaMismatch));
  }
}
