// 该文件是 Shouyu （手语译风） 项目的一部分。
// src/model/onnx.rs - ONNX 模型推理
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;
use tract_onnx::prelude::*;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, feature::FEATURE_LEN, label::SIGN_LABELS, model::Model,
};

const ONNX_NUM_INPUTS: usize = 1;
const ONNX_NUM_OUTPUTS: usize = 1;

const ONNX_SCHEME: &str = "onnx";

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

#[derive(Error, Debug)]
pub enum OnnxModelError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("模型推理错误: {0}")]
  Inference(TractError),
}

impl From<TractError> for OnnxModelError {
  fn from(err: TractError) -> Self {
    OnnxModelError::Inference(err)
  }
}

/// ONNX 模型构建器
///
/// 模型文件被视为黑盒: 一个把 225 个浮点数映射为各类别评分的
/// 函数。输入输出的形状在加载时校验一次，之后不再检查。
pub struct OnnxModelBuilder {
  model_path: String,
  num_classes: usize,
}

impl FromUrlWithScheme for OnnxModelBuilder {
  const SCHEME: &'static str = ONNX_SCHEME;
}

impl FromUrl for OnnxModelBuilder {
  type Error = OnnxModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != ONNX_SCHEME {
      return Err(OnnxModelError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        ONNX_SCHEME
      )));
    }

    Ok(OnnxModelBuilder {
      model_path: url.path().to_string(),
      num_classes: SIGN_LABELS.len(),
    })
  }
}

impl OnnxModelBuilder {
  /// 覆盖类别数量，必须与标签表一致
  pub fn num_classes(mut self, num_classes: usize) -> Self {
    self.num_classes = num_classes;
    self
  }

  pub fn build(self) -> Result<OnnxModel, OnnxModelError> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    let model = tract_onnx::onnx()
      .model_for_read(&mut std::io::Cursor::new(&model_data))?
      .with_input_fact(0, f32::fact([1, FEATURE_LEN]).into())?
      .into_optimized()?;

    if model.inputs.len() != ONNX_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        ONNX_NUM_INPUTS,
        model.inputs.len()
      );
      return Err(OnnxModelError::ModelInvalid(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        ONNX_NUM_INPUTS,
        model.inputs.len()
      )));
    }

    if model.outputs.len() != ONNX_NUM_OUTPUTS {
      error!(
        "预期模型输出数量为 {}, 实际为 {}",
        ONNX_NUM_OUTPUTS,
        model.outputs.len()
      );
      return Err(OnnxModelError::ModelInvalid(format!(
        "预期模型输出数量为 {}, 实际为 {}",
        ONNX_NUM_OUTPUTS,
        model.outputs.len()
      )));
    }

    // 输出元素总数必须与标签表一致，否则所有预测都会错位
    if let Some(shape) = model.output_fact(0)?.shape.as_concrete() {
      let total: usize = shape.iter().product();
      if total != self.num_classes {
        error!(
          "预期模型输出 {} 个类别评分, 实际为 {}",
          self.num_classes, total
        );
        return Err(OnnxModelError::ModelInvalid(format!(
          "预期模型输出 {} 个类别评分, 实际为 {}",
          self.num_classes, total
        )));
      }
    }

    let plan = model.into_runnable()?;
    info!("模型加载完成");

    Ok(OnnxModel {
      plan,
      num_classes: self.num_classes,
    })
  }
}

/// 已加载的 ONNX 模型，加载后只读
pub struct OnnxModel {
  plan: OnnxPlan,
  num_classes: usize,
}

impl OnnxModel {
  pub fn num_classes(&self) -> usize {
    self.num_classes
  }
}

impl Model for OnnxModel {
  type Input = [f32];
  type Output = Box<[f32]>;
  type Error = OnnxModelError;

  fn infer(&self, input: &[f32]) -> Result<Box<[f32]>, OnnxModelError> {
    if input.len() != FEATURE_LEN {
      return Err(OnnxModelError::ModelInvalid(format!(
        "输入长度 {} 与模型输入 {} 不符",
        input.len(),
        FEATURE_LEN
      )));
    }

    debug!("设置模型输入");
    let tensor = tract_ndarray::Array2::from_shape_vec((1, FEATURE_LEN), input.to_vec())
      .map_err(|e| OnnxModelError::ModelInvalid(e.to_string()))?
      .into_tensor();

    debug!("执行模型推理");
    let outputs = self.plan.run(tvec!(tensor.into_tvalue()))?;

    let scores = outputs[0].to_array_view::<f32>()?;
    Ok(scores.iter().copied().collect())
  }
}
