// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/feature.rs - 特征向量编码
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

use thiserror::Error;

use crate::landmark::{FrameDetections, HAND_LANDMARKS, POSE_LANDMARKS};

/// 每个关键点的通道数
pub const LANDMARK_CHANNELS: usize = 3;
/// 特征向量长度: 3 × (33 + 21 + 21) = 225
pub const FEATURE_LEN: usize = LANDMARK_CHANNELS * (POSE_LANDMARKS + 2 * HAND_LANDMARKS);
/// 缺失关键点组的填充值
///
/// 模型就是按该填充值训练的，有效坐标落在 [0, 1] 区间内，
/// 不会与 -1.0 混淆。该约定不可更改。
pub const ABSENT_FILL: f32 = -1.0;

#[derive(Error, Debug)]
pub enum EncodeError {
  #[error("关键点组 {group} 数量不匹配: 期望 {expected}, 实际 {actual}")]
  LandmarkCountMismatch {
    group: &'static str,
    expected: usize,
    actual: usize,
  },
}

/// 固定长度特征向量
///
/// 布局为 [姿态块][左手块][右手块]，每块按关键点序号依次排列
/// (c0, c1, c2) 三通道。这是编码器与分类器之间唯一的契约，
/// 长度与顺序在任何帧之间都不会变化。
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
  data: Box<[f32]>,
}

impl FeatureVector {
  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

impl std::ops::Deref for FeatureVector {
  type Target = [f32];

  fn deref(&self) -> &[f32] {
    &self.data
  }
}

impl AsRef<[f32]> for FeatureVector {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

/// 特征编码器
///
/// 无状态的纯变换，不依赖前序帧，也不做任何时间平滑。
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
  /// 把一帧检测结果编码为定长特征向量
  ///
  /// 缺失的关键点组整块填充 [`ABSENT_FILL`]；存在的组逐通道
  /// 原样拷贝，不缩放、不截断、不重排。存在但数量不符的组
  /// 立即报错，静默错位会毁掉之后所有的分类结果。
  pub fn encode(&self, frame: &FrameDetections) -> Result<FeatureVector, EncodeError> {
    let mut data = vec![ABSENT_FILL; FEATURE_LEN];

    if let Some(pose) = &frame.pose {
      if pose.len() != POSE_LANDMARKS {
        return Err(EncodeError::LandmarkCountMismatch {
          group: "pose",
          expected: POSE_LANDMARKS,
          actual: pose.len(),
        });
      }
      for (index, landmark) in pose.iter().enumerate() {
        let at = LANDMARK_CHANNELS * index;
        data[at..at + LANDMARK_CHANNELS].copy_from_slice(&landmark.channels());
      }
    }

    let left_base = LANDMARK_CHANNELS * POSE_LANDMARKS;
    if let Some(left) = &frame.left_hand {
      if left.len() != HAND_LANDMARKS {
        return Err(EncodeError::LandmarkCountMismatch {
          group: "left_hand",
          expected: HAND_LANDMARKS,
          actual: left.len(),
        });
      }
      for (index, landmark) in left.iter().enumerate() {
        let at = left_base + LANDMARK_CHANNELS * index;
        data[at..at + LANDMARK_CHANNELS].copy_from_slice(&landmark.channels());
      }
    }

    let right_base = LANDMARK_CHANNELS * (POSE_LANDMARKS + HAND_LANDMARKS);
    if let Some(right) = &frame.right_hand {
      if right.len() != HAND_LANDMARKS {
        return Err(EncodeError::LandmarkCountMismatch {
          group: "right_hand",
          expected: HAND_LANDMARKS,
          actual: right.len(),
        });
      }
      for (index, landmark) in right.iter().enumerate() {
        let at = right_base + LANDMARK_CHANNELS * index;
        data[at..at + LANDMARK_CHANNELS].copy_from_slice(&landmark.channels());
      }
    }

    Ok(FeatureVector {
      data: data.into_boxed_slice(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::landmark::{HandLandmark, PoseLandmark};

  fn pose_points(count: usize) -> Vec<PoseLandmark> {
    (0..count)
      .map(|i| PoseLandmark {
        x: i as f32 / 100.0,
        y: i as f32 / 200.0,
        visibility: 0.5,
      })
      .collect()
  }

  fn hand_points(count: usize) -> Vec<HandLandmark> {
    (0..count)
      .map(|i| HandLandmark {
        x: i as f32 / 100.0,
        y: i as f32 / 200.0,
        z: -0.01 * i as f32,
      })
      .collect()
  }

  #[test]
  fn all_absent_fills_sentinel() {
    let vector = FeatureEncoder.encode(&FrameDetections::default()).unwrap();
    assert_eq!(vector.len(), FEATURE_LEN);
    assert!(vector.iter().all(|&v| v == ABSENT_FILL));
  }

  #[test]
  fn wrong_pose_count_is_rejected() {
    let frame = FrameDetections {
      pose: Some(pose_points(32)),
      ..Default::default()
    };
    let err = FeatureEncoder.encode(&frame).unwrap_err();
    assert!(matches!(
      err,
      EncodeError::LandmarkCountMismatch {
        group: "pose",
        expected: 33,
        actual: 32,
      }
    ));
  }

  #[test]
  fn wrong_hand_count_is_rejected() {
    for count in [20, 22] {
      let frame = FrameDetections {
        left_hand: Some(hand_points(count)),
        ..Default::default()
      };
      let err = FeatureEncoder.encode(&frame).unwrap_err();
      assert!(matches!(
        err,
        EncodeError::LandmarkCountMismatch {
          group: "left_hand",
          expected: 21,
          ..
        }
      ));
    }
  }

  #[test]
  fn pose_only_layout() {
    let frame = FrameDetections {
      pose: Some(pose_points(33)),
      ..Default::default()
    };
    let vector = FeatureEncoder.encode(&frame).unwrap();

    for (i, landmark) in pose_points(33).iter().enumerate() {
      assert_eq!(vector[3 * i], landmark.x);
      assert_eq!(vector[3 * i + 1], landmark.y);
      assert_eq!(vector[3 * i + 2], landmark.visibility);
    }
    // 两个手部块各 63 个填充值
    assert!(vector[99..].iter().all(|&v| v == ABSENT_FILL));
    assert_eq!(vector[99..].len(), 126);
  }

  #[test]
  fn hand_blocks_follow_pose_block() {
    let frame = FrameDetections {
      left_hand: Some(hand_points(21)),
      right_hand: Some(hand_points(21)),
      ..Default::default()
    };
    let vector = FeatureEncoder.encode(&frame).unwrap();

    assert!(vector[..99].iter().all(|&v| v == ABSENT_FILL));
    assert_eq!(vector[99], 0.0);
    assert_eq!(vector[99 + 3], 0.01);
    assert_eq!(vector[162], 0.0);
    assert_eq!(vector[162 + 5], -0.01);
  }

  #[test]
  fn encoding_is_deterministic() {
    let frame = FrameDetections {
      pose: Some(pose_points(33)),
      left_hand: Some(hand_points(21)),
      ..Default::default()
    };
    let a = FeatureEncoder.encode(&frame).unwrap();
    let b = FeatureEncoder.encode(&frame).unwrap();
    assert_eq!(a, b);
  }
}
