// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/classifier.rs - 手语分类器
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::feature::FEATURE_LEN;
use crate::label::LabelTable;
use crate::model::Model;

/// 单帧的分类结果
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
  pub class_id: usize,
  /// 模型对该类别的原始输出值，不保证已归一化
  pub score: f32,
  pub label: String,
}

impl std::fmt::Display for Prediction {
  /// 与原始界面一致的展示格式，评分保留两位小数
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:.2} <=> {}", self.score, self.label)
  }
}

#[derive(Error, Debug)]
pub enum ClassifyError {
  #[error("特征向量维度不匹配: 期望 {expected}, 实际 {actual}")]
  DimensionMismatch { expected: usize, actual: usize },
  #[error("模型尚未加载完成")]
  NotReady,
  #[error("模型加载失败: {0}")]
  LoadFailed(String),
  #[error("类别索引 {0} 超出标签表")]
  UnknownClass(usize),
  #[error("模型推理错误: {0}")]
  Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 可按帧调用的分类入口
///
/// [`SignClassifier`] 与 [`ClassifierHandle`] 都实现该接口，
/// 任务循环不关心模型是直接持有还是后台加载。
pub trait Classify {
  fn classify(&self, features: &[f32]) -> Result<Prediction, ClassifyError>;
}

impl<T: Classify + ?Sized> Classify for &T {
  fn classify(&self, features: &[f32]) -> Result<Prediction, ClassifyError> {
    (**self).classify(features)
  }
}

/// 手语分类器
///
/// 持有已加载的模型与标签表，两者在构造后均为只读。
/// [`SignClassifier::classify`] 可重入，调用之间没有内部状态。
pub struct SignClassifier<M> {
  model: M,
  labels: LabelTable,
}

impl<M> SignClassifier<M>
where
  M: Model<Input = [f32], Output = Box<[f32]>>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  pub fn new(model: M, labels: LabelTable) -> Self {
    Self { model, labels }
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  /// 对一帧特征向量做分类
  ///
  /// 决策规则: 从左到右扫描评分序列取严格最大值，相等时保留
  /// 较小的索引。
  pub fn classify(&self, features: &[f32]) -> Result<Prediction, ClassifyError> {
    if features.len() != FEATURE_LEN {
      return Err(ClassifyError::DimensionMismatch {
        expected: FEATURE_LEN,
        actual: features.len(),
      });
    }

    let scores = self
      .model
      .infer(features)
      .map_err(|e| ClassifyError::Inference(Box::new(e)))?;

    if scores.is_empty() {
      error!("模型输出为空, 模型与标签表部署不一致");
      return Err(ClassifyError::UnknownClass(0));
    }

    let mut class_id = 0usize;
    let mut best = f32::MIN;
    for (id, &score) in scores.iter().enumerate() {
      if score > best {
        best = score;
        class_id = id;
      }
    }

    let label = match self.labels.get(class_id) {
      Some(label) => label.to_string(),
      None => {
        error!(
          "类别索引 {} 超出标签表 (共 {} 项), 模型与标签表部署不一致",
          class_id,
          self.labels.len()
        );
        return Err(ClassifyError::UnknownClass(class_id));
      }
    };

    debug!("分类结果: {} ({:.2})", label, best);

    Ok(Prediction {
      class_id,
      score: best,
      label,
    })
  }
}

impl<M> Classify for SignClassifier<M>
where
  M: Model<Input = [f32], Output = Box<[f32]>>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  fn classify(&self, features: &[f32]) -> Result<Prediction, ClassifyError> {
    SignClassifier::classify(self, features)
  }
}

/// 分类器的加载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
  Loading,
  Ready,
  Failed,
}

enum LoadSlot<M> {
  Loading,
  Ready(SignClassifier<M>),
  Failed(String),
}

/// 后台加载的分类器句柄
///
/// 模型加载是进程启动时的一次性操作，放在后台线程执行；
/// 就绪与否是显式状态，加载完成前的分类调用返回
/// [`ClassifyError::NotReady`]，加载失败后的调用返回
/// [`ClassifyError::LoadFailed`]。
pub struct ClassifierHandle<M> {
  slot: Arc<(Mutex<LoadSlot<M>>, Condvar)>,
}

impl<M> Clone for ClassifierHandle<M> {
  fn clone(&self) -> Self {
    Self {
      slot: self.slot.clone(),
    }
  }
}

impl<M> ClassifierHandle<M>
where
  M: Model<Input = [f32], Output = Box<[f32]>> + Send + 'static,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  /// 在后台线程执行加载
  pub fn spawn<F, E>(load: F) -> Self
  where
    F: FnOnce() -> Result<SignClassifier<M>, E> + Send + 'static,
    E: std::fmt::Display,
  {
    let slot = Arc::new((Mutex::new(LoadSlot::Loading), Condvar::new()));
    let worker = slot.clone();

    thread::spawn(move || {
      let state = match load() {
        Ok(classifier) => {
          info!("分类器就绪");
          LoadSlot::Ready(classifier)
        }
        Err(e) => {
          error!("模型加载失败: {}", e);
          LoadSlot::Failed(e.to_string())
        }
      };
      let (lock, cvar) = &*worker;
      *lock.lock().unwrap() = state;
      cvar.notify_all();
    });

    Self { slot }
  }

  /// 包装一个已经加载完毕的分类器
  pub fn ready(classifier: SignClassifier<M>) -> Self {
    Self {
      slot: Arc::new((Mutex::new(LoadSlot::Ready(classifier)), Condvar::new())),
    }
  }

  pub fn state(&self) -> ClassifierState {
    let (lock, _) = &*self.slot;
    match &*lock.lock().unwrap() {
      LoadSlot::Loading => ClassifierState::Loading,
      LoadSlot::Ready(_) => ClassifierState::Ready,
      LoadSlot::Failed(_) => ClassifierState::Failed,
    }
  }

  /// 阻塞等待加载结束
  pub fn wait(&self) -> Result<(), ClassifyError> {
    let (lock, cvar) = &*self.slot;
    let mut guard = lock.lock().unwrap();
    while matches!(&*guard, LoadSlot::Loading) {
      guard = cvar.wait(guard).unwrap();
    }
    match &*guard {
      LoadSlot::Failed(reason) => Err(ClassifyError::LoadFailed(reason.clone())),
      _ => Ok(()),
    }
  }
}

impl<M> Classify for ClassifierHandle<M>
where
  M: Model<Input = [f32], Output = Box<[f32]>> + Send + 'static,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  fn classify(&self, features: &[f32]) -> Result<Prediction, ClassifyError> {
    let (lock, _) = &*self.slot;
    let guard = lock.lock().unwrap();
    match &*guard {
      LoadSlot::Loading => Err(ClassifyError::NotReady),
      LoadSlot::Failed(reason) => Err(ClassifyError::LoadFailed(reason.clone())),
      LoadSlot::Ready(classifier) => classifier.classify(features),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;
  use std::sync::mpsc;

  use super::*;
  use crate::feature::{ABSENT_FILL, FEATURE_LEN, FeatureEncoder};
  use crate::landmark::{FrameDetections, PoseLandmark};
  use crate::model::Model;

  #[derive(Debug, Clone)]
  struct FixtureModel {
    scores: Vec<f32>,
  }

  impl Model for FixtureModel {
    type Input = [f32];
    type Output = Box<[f32]>;
    type Error = Infallible;

    fn infer(&self, _input: &[f32]) -> Result<Box<[f32]>, Infallible> {
      Ok(self.scores.clone().into_boxed_slice())
    }
  }

  fn classifier(scores: Vec<f32>) -> SignClassifier<FixtureModel> {
    SignClassifier::new(FixtureModel { scores }, LabelTable::default())
  }

  fn fourteen(at: usize, value: f32) -> Vec<f32> {
    let mut scores = vec![0.0; 14];
    scores[at] = value;
    scores
  }

  fn pose_frame() -> FrameDetections {
    FrameDetections {
      pose: Some(
        (0..33)
          .map(|i| PoseLandmark {
            x: i as f32 / 33.0,
            y: i as f32 / 66.0,
            visibility: 0.9,
          })
          .collect(),
      ),
      ..Default::default()
    }
  }

  #[test]
  fn dimension_mismatch_is_rejected() {
    let classifier = classifier(fourteen(0, 1.0));
    for len in [0usize, 224, 226] {
      let err = classifier.classify(&vec![0.0; len]).unwrap_err();
      assert!(matches!(
        err,
        ClassifyError::DimensionMismatch {
          expected: FEATURE_LEN,
          actual,
        } if actual == len
      ));
    }
  }

  #[test]
  fn tie_break_keeps_lowest_index() {
    let mut scores = vec![0.1; 14];
    scores[3] = 0.7;
    scores[7] = 0.7;
    let prediction = classifier(scores).classify(&vec![0.0; FEATURE_LEN]).unwrap();
    assert_eq!(prediction.class_id, 3);
  }

  #[test]
  fn classification_is_deterministic() {
    let classifier = classifier(fourteen(5, 0.8));
    let features = vec![0.25; FEATURE_LEN];
    let a = classifier.classify(&features).unwrap();
    let b = classifier.classify(&features).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn pose_only_frame_with_unit_fixture_maps_to_no_sign() {
    let vector = FeatureEncoder.encode(&pose_frame()).unwrap();
    assert!(vector[99..].iter().all(|&v| v == ABSENT_FILL));

    let prediction = classifier(fourteen(0, 1.0)).classify(&vector).unwrap();
    assert_eq!(prediction.class_id, 0);
    assert_eq!(prediction.label, "-");
  }

  #[test]
  fn production_table_resolves_class_two() {
    let mut scores = vec![0.0; 14];
    scores[0] = 0.1;
    scores[1] = 0.2;
    scores[2] = 0.9;
    let prediction = classifier(scores).classify(&vec![0.0; FEATURE_LEN]).unwrap();
    assert_eq!(prediction.class_id, 2);
    assert_eq!(prediction.label, "¿Cómo estás?");
    assert_eq!(prediction.to_string(), "0.90 <=> ¿Cómo estás?");
  }

  #[test]
  fn class_outside_label_table_is_fatal() {
    let mut scores = vec![0.0; 20];
    scores[17] = 0.9;
    let err = classifier(scores).classify(&vec![0.0; FEATURE_LEN]).unwrap_err();
    assert!(matches!(err, ClassifyError::UnknownClass(17)));
  }

  #[test]
  fn handle_reports_not_ready_until_load_completes() {
    let (release, gate) = mpsc::channel::<()>();
    let handle = ClassifierHandle::spawn(move || {
      gate.recv().unwrap();
      Ok::<_, String>(classifier(fourteen(1, 0.9)))
    });

    assert_eq!(handle.state(), ClassifierState::Loading);
    let err = handle.classify(&vec![0.0; FEATURE_LEN]).unwrap_err();
    assert!(matches!(err, ClassifyError::NotReady));

    release.send(()).unwrap();
    handle.wait().unwrap();
    assert_eq!(handle.state(), ClassifierState::Ready);

    let prediction = handle.classify(&vec![0.0; FEATURE_LEN]).unwrap();
    assert_eq!(prediction.label, "Hola");
  }

  #[test]
  fn handle_reports_failed_load() {
    let handle = ClassifierHandle::<FixtureModel>::spawn(|| Err("没有模型".to_string()));

    let err = handle.wait().unwrap_err();
    assert!(matches!(err, ClassifyError::LoadFailed(_)));
    assert_eq!(handle.state(), ClassifierState::Failed);

    let err = handle.classify(&vec![0.0; FEATURE_LEN]).unwrap_err();
    assert!(matches!(err, ClassifyError::LoadFailed(_)));
  }
}
