// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/landmark.rs - 关键点检测数据定义
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

use serde::{Deserialize, Serialize};

/// 身体姿态关键点数量（检测器固定输出 33 个）
pub const POSE_LANDMARKS: usize = 33;
/// 单手关键点数量（检测器固定输出 21 个）
pub const HAND_LANDMARKS: usize = 21;

/// 身体姿态关键点
///
/// 第三通道是可见度评分，不是深度坐标。两类关键点的通道含义
/// 由各自的检测器约定，按位置传递，不做统一。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmark {
  pub x: f32,
  pub y: f32,
  #[serde(default)]
  pub visibility: f32,
}

/// 手部关键点，第三通道是深度坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandLandmark {
  pub x: f32,
  pub y: f32,
  #[serde(default)]
  pub z: f32,
}

impl PoseLandmark {
  pub fn channels(&self) -> [f32; 3] {
    [self.x, self.y, self.visibility]
  }
}

impl HandLandmark {
  pub fn channels(&self) -> [f32; 3] {
    [self.x, self.y, self.z]
  }
}

/// 一帧的全部检测结果
///
/// 三组关键点相互独立，任何一组都可能缺失（该帧没有检测到）。
/// 字段名与检测器的 JSON 输出保持一致。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
  #[serde(rename = "poseLandmarks", default, skip_serializing_if = "Option::is_none")]
  pub pose: Option<Vec<PoseLandmark>>,
  #[serde(rename = "leftHandLandmarks", default, skip_serializing_if = "Option::is_none")]
  pub left_hand: Option<Vec<HandLandmark>>,
  #[serde(rename = "rightHandLandmarks", default, skip_serializing_if = "Option::is_none")]
  pub right_hand: Option<Vec<HandLandmark>>,
}

impl FrameDetections {
  /// 该帧是否没有任何检测结果
  pub fn is_empty(&self) -> bool {
    self.pose.is_none() && self.left_hand.is_none() && self.right_hand.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detector_json_field_names() {
    let line = r#"{
      "poseLandmarks": [{"x": 0.5, "y": 0.25, "visibility": 0.9}],
      "leftHandLandmarks": [{"x": 0.1, "y": 0.2, "z": -0.03}]
    }"#;
    let frame: FrameDetections = serde_json::from_str(line).unwrap();

    let pose = frame.pose.unwrap();
    assert_eq!(pose.len(), 1);
    assert_eq!(pose[0].channels(), [0.5, 0.25, 0.9]);

    let left = frame.left_hand.unwrap();
    assert_eq!(left[0].channels(), [0.1, 0.2, -0.03]);

    assert!(frame.right_hand.is_none());
  }

  #[test]
  fn empty_object_means_no_detections() {
    let frame: FrameDetections = serde_json::from_str("{}").unwrap();
    assert!(frame.is_empty());
  }

  #[test]
  fn unknown_fields_are_ignored() {
    let line = r#"{"image": "frame-0001.png", "poseLandmarks": []}"#;
    let frame: FrameDetections = serde_json::from_str(line).unwrap();
    assert_eq!(frame.pose, Some(vec![]));
  }
}
