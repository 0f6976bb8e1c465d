// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/output/console.rs - 控制台输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;
use url::Url;

use crate::classifier::Prediction;
use crate::landmark::FrameDetections;
use crate::output::Render;
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 控制台输出
///
/// 每帧打印 `评分 <=> 标签` 一行，与原始界面的展示文本相同。
/// 带 `?only-signs` 查询参数时跳过未识别帧。
pub struct ConsoleOutput {
  only_signs: bool,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch);
    }

    let only_signs = url.query_pairs().any(|(k, _)| k == "only-signs");

    Ok(ConsoleOutput { only_signs })
  }
}

impl Render<FrameDetections, Prediction> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(
    &self,
    _frame: &FrameDetections,
    result: &Prediction,
  ) -> Result<(), Self::Error> {
    if self.only_signs && result.class_id == crate::label::NO_SIGN_CLASS {
      return Ok(());
    }
    println!("{}", result);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scheme_selects_console() {
    let url = Url::parse("console:").unwrap();
    let output = ConsoleOutput::from_url(&url).unwrap();
    assert!(!output.only_signs);

    let url = Url::parse("console:?only-signs").unwrap();
    let output = ConsoleOutput::from_url(&url).unwrap();
    assert!(output.only_signs);
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("folder:/tmp/records").unwrap();
    assert!(ConsoleOutput::from_url(&url).is_err());
  }
}
