// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/input.rs - 检测输入
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::sync::{Arc, Condvar, Mutex};

use thiserror::Error;

use crate::FromUrl;
use crate::landmark::FrameDetections;

#[cfg(feature = "jsonl_input")]
mod jsonl;
#[cfg(feature = "jsonl_input")]
pub use self::jsonl::{JsonLinesInput, JsonLinesInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "jsonl_input")]
  #[error("JSON Lines 输入错误: {0}")]
  JsonLinesInputError(#[from] JsonLinesInputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum InputWrapper {
  #[cfg(feature = "jsonl_input")]
  JsonLines(JsonLinesInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "jsonl_input")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == JsonLinesInput::SCHEME {
        let input = JsonLinesInput::from_url(url)?;
        return Ok(InputWrapper::JsonLines(input));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

impl Iterator for InputWrapper {
  type Item = Result<FrameDetections, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "jsonl_input")]
      InputWrapper::JsonLines(input) => input.next().map(|item| item.map_err(InputError::from)),
    }
  }
}

struct SlotState<T> {
  value: Option<T>,
  closed: bool,
  dropped: u64,
}

/// 单槽“最新帧胜出”缓冲
///
/// 检测来源按自己的节奏发布帧；如果上一帧尚未被消费，新帧
/// 直接顶掉它。消费端永远拿到最新一帧，内存占用有上界，
/// 不会形成积压队列。
pub struct LatestSlot<T> {
  inner: Arc<(Mutex<SlotState<T>>, Condvar)>,
}

impl<T> Clone for LatestSlot<T> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<T> Default for LatestSlot<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> LatestSlot<T> {
  pub fn new() -> Self {
    Self {
      inner: Arc::new((
        Mutex::new(SlotState {
          value: None,
          closed: false,
          dropped: 0,
        }),
        Condvar::new(),
      )),
    }
  }

  /// 发布一帧，覆盖未消费的旧帧
  pub fn publish(&self, value: T) {
    let (lock, cvar) = &*self.inner;
    let mut state = lock.lock().unwrap();
    if state.value.replace(value).is_some() {
      state.dropped += 1;
    }
    cvar.notify_one();
  }

  /// 关闭缓冲，消费端在取空后收到 `None`
  pub fn close(&self) {
    let (lock, cvar) = &*self.inner;
    lock.lock().unwrap().closed = true;
    cvar.notify_all();
  }

  /// 阻塞取出最新一帧；缓冲关闭且已取空时返回 `None`
  pub fn take(&self) -> Option<T> {
    let (lock, cvar) = &*self.inner;
    let mut state = lock.lock().unwrap();
    loop {
      if let Some(value) = state.value.take() {
        return Some(value);
      }
      if state.closed {
        return None;
      }
      state = cvar.wait(state).unwrap();
    }
  }

  /// 非阻塞取出最新一帧
  pub fn try_take(&self) -> Option<T> {
    let (lock, _) = &*self.inner;
    lock.lock().unwrap().value.take()
  }

  /// 被覆盖丢弃的帧数
  pub fn dropped(&self) -> u64 {
    let (lock, _) = &*self.inner;
    lock.lock().unwrap().dropped
  }
}
