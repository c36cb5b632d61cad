//! Shared ONNX Runtime plumbing for the detector and face-mesh stages:
//! session construction, input layout discovery, and image → tensor packing.
use std::path::Path;

use image::RgbImage;
use ndarray::Array4;

use crate::detection::domain::face_box::FaceBox;

/// Channel placement of a model's image input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, 3, H, W]`, the PyTorch-style export.
    Nchw,
    /// `[1, H, W, 3]`, the TFLite-converted export.
    Nhwc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelInput {
    pub layout: TensorLayout,
    pub size: u32,
}

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Load a model with the platform's preferred execution providers.
pub fn build_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let session = ort::session::Session::builder()?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Reads the square input resolution and layout from the model's first input.
///
/// Falls back to NHWC at `default_size` when the shape is dynamic or unreadable.
pub fn model_input(session: &ort::session::Session, default_size: u32) -> ModelInput {
    session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                let dims: Vec<i64> = shape.iter().copied().collect();
                input_from_shape(&dims)
            } else {
                None
            }
        })
        .unwrap_or(ModelInput {
            layout: TensorLayout::Nhwc,
            size: default_size,
        })
}

fn input_from_shape(dims: &[i64]) -> Option<ModelInput> {
    if dims.len() != 4 {
        return None;
    }
    let (layout, side) = if dims[1] == 3 {
        (TensorLayout::Nchw, dims[2])
    } else if dims[3] == 3 {
        (TensorLayout::Nhwc, dims[1])
    } else {
        return None;
    };
    (side > 0).then_some(ModelInput {
        layout,
        size: side as u32,
    })
}

/// Packs an already-resized RGB image into a batch-of-one float tensor.
pub fn image_to_tensor(img: &RgbImage, layout: TensorLayout, normalize: impl Fn(u8) -> f32) -> Array4<f32> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut tensor = match layout {
        TensorLayout::Nchw => Array4::<f32>::zeros((1, 3, h, w)),
        TensorLayout::Nhwc => Array4::<f32>::zeros((1, h, w, 3)),
    };
    for (x, y, pixel) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let v = normalize(pixel[c]);
            match layout {
                TensorLayout::Nchw => tensor[[0, c, y, x]] = v,
                TensorLayout::Nhwc => tensor[[0, y, x, c]] = v,
            }
        }
    }
    tensor
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Greedy non-maximum suppression; output is sorted by descending score.
pub fn nms(mut boxes: Vec<FaceBox>, iou_thresh: f64) -> Vec<FaceBox> {
    boxes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceBox> = Vec::new();
    for candidate in boxes {
        if keep.iter().all(|k| k.iou(&candidate) <= iou_thresh) {
            keep.push(candidate);
        }
    }
    keep
}
