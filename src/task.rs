// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/task.rs - 任务定义
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

use std::{thread, time::Duration};

use tracing::{info, warn};

use crate::{
  classifier::{Classify, Prediction},
  feature::FeatureEncoder,
  landmark::FrameDetections,
  output::Render,
};

pub trait Task<I, C, O>: Sized {
  type Error;
  fn run_task(self, input: I, classifier: C, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<
  IE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<FrameDetections, IE>>,
  C: Classify,
  O: Render<FrameDetections, Prediction, Error = RE>,
> Task<I, C, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, classifier: C, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))??;
    info!("检测帧获取成功，开始推理...");
    let now = std::time::Instant::now();
    let features = FeatureEncoder.encode(&frame)?;
    let prediction = classifier.classify(&features)?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}", elapsed);
    output.render_result(&frame, &prediction)?;
    info!("渲染完成，耗时: {:.2?}", elapsed);

    Ok(())
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<
  IE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<FrameDetections, IE>>,
  C: Classify,
  O: Render<FrameDetections, Prediction, Error = RE>,
> Task<I, C, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, classifier: C, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
    .expect("Error setting Ctrl-C handler");

    let mut frame_index = 0;
    let mut now = std::time::Instant::now();
    for frame in input {
      let frame = frame?;
      frame_index = (frame_index + 1) % usize::MAX;
      info!("处理第 {} 帧检测", frame_index);
      let features = FeatureEncoder.encode(&frame)?;
      let prediction = classifier.classify(&features)?;
      let elapsed_a = now.elapsed();
      output.render_result(&frame, &prediction)?;
      let elapsed_b = now.elapsed();
      now = std::time::Instant::now();
      info!("推理完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);
      if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，退出");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::convert::Infallible;

  use super::*;
  use crate::classifier::{ClassifyError, SignClassifier};
  use crate::label::LabelTable;
  use crate::model::Model;

  #[derive(Debug)]
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

  struct CollectOutput {
    predictions: RefCell<Vec<Prediction>>,
  }

  impl Render<FrameDetections, Prediction> for CollectOutput {
    type Error = ClassifyError;

    fn render_result(
      &self,
      _frame: &FrameDetections,
      result: &Prediction,
    ) -> Result<(), Self::Error> {
      self.predictions.borrow_mut().push(result.clone());
      Ok(())
    }
  }

  #[test]
  fn one_shot_classifies_the_first_frame() {
    let mut scores = vec![0.0; 14];
    scores[1] = 0.8;
    let classifier = SignClassifier::new(FixtureModel { scores }, LabelTable::default());

    let frames = vec![
      Ok::<_, std::io::Error>(FrameDetections::default()),
      Ok(FrameDetections::default()),
    ];
    let output = CollectOutput {
      predictions: RefCell::new(Vec::new()),
    };

    OneShotTask
      .run_task(frames.into_iter(), &classifier, &output)
      .unwrap();

    let predictions = output.predictions.borrow();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].label, "Hola");
  }

  #[test]
  fn one_shot_without_frames_is_an_error() {
    let classifier = SignClassifier::new(
      FixtureModel {
        scores: vec![1.0; 14],
      },
      LabelTable::default(),
    );
    let frames: Vec<Result<FrameDetections, std::io::Error>> = Vec::new();
    let output = CollectOutput {
      predictions: RefCell::new(Vec::new()),
    };

    let result = OneShotTask.run_task(frames.into_iter(), &classifier, &output);
    assert!(result.is_err());
  }
}
