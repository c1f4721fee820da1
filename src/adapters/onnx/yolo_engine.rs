use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayView2, ArrayViewD, Axis, Ix2, IxDyn};
#[cfg(feature = "cuda")]
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::time::Instant;

use crate::domain::detection::{Detection, ModelOutput};
use crate::domain::model::YoloParams;
use crate::domain::stats::Speed;

pub struct OnnxYoloEngine {
    session: Session,
    params: YoloParams,
}

impl OnnxYoloEngine {
    pub fn load(path: &str, params: YoloParams, intra_threads: usize) -> Result<Self> {
        #[allow(unused_mut)]
        let mut builder = Session::builder()?.with_intra_threads(intra_threads)?;

        // CUDA is optional. Registration failure leaves the session on CPU.
        #[cfg(feature = "cuda")]
        {
            let cuda = CUDAExecutionProvider::default().build();
            if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
                builder = builder_with_cuda;
            }
        }

        let session = builder.commit_from_file(path)?;

        Ok(Self { session, params })
    }

    pub fn params(&self) -> &YoloParams {
        &self.params
    }

    /// Runs one pass over a blank frame so the first real request does not pay for allocation.
    pub fn warmup(&mut self) -> Result<()> {
        let size = self.params.input_size;
        let blank = RgbImage::new(size, size);
        self.infer(&blank).map(|_| ())
    }

    pub fn infer(&mut self, rgb: &RgbImage) -> Result<ModelOutput> {
        let imgsz = self.params.input_size as usize;

        let t_pre = Instant::now();
        let (input, letterbox) = preprocess(rgb, imgsz);
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Tensor::from_array(([1usize, 3, imgsz, imgsz], data))?;
        let preprocess_ms = elapsed_ms(t_pre);

        let t_infer = Instant::now();
        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let inference_ms = elapsed_ms(t_infer);

        let t_post = Instant::now();
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        // YOLOv8/11 export: [1, 4 + num_classes, num_candidates]
        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[0] != 1 || dims[1] < 5 {
            return Err(anyhow!("unexpected model output shape {:?}", dims));
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()?;

        let detections = postprocess(view, rgb.width(), rgb.height(), letterbox, &self.params);
        let postprocess_ms = elapsed_ms(t_post);

        Ok(ModelOutput {
            detections,
            speed: Speed {
                preprocess: preprocess_ms,
                inference: inference_ms,
                postprocess: postprocess_ms,
            },
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Gray fill used for the letterbox border (ultralytics pads with 114).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Geometry of an aspect-preserving resize into a square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Letterbox {
    pub gain: f32,
    pub new_w: u32,
    pub new_h: u32,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    pub(crate) fn fit(orig_w: u32, orig_h: u32, imgsz: usize) -> Self {
        let size = imgsz as f32;
        let gain = (size / orig_w.max(1) as f32).min(size / orig_h.max(1) as f32);

        let new_w = ((orig_w as f32 * gain).round() as u32).clamp(1, imgsz as u32);
        let new_h = ((orig_h as f32 * gain).round() as u32).clamp(1, imgsz as u32);

        Self {
            gain,
            new_w,
            new_h,
            pad_x: (imgsz as u32 - new_w) / 2,
            pad_y: (imgsz as u32 - new_h) / 2,
        }
    }

    /// Maps a model-space coordinate pair back onto the original image.
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.gain,
            (y - self.pad_y as f32) / self.gain,
        )
    }
}

/// Letterboxes into `imgsz x imgsz` and lays out as normalized NCHW.
pub(crate) fn preprocess(rgb: &RgbImage, imgsz: usize) -> (Array4<f32>, Letterbox) {
    let lb = Letterbox::fit(rgb.width(), rgb.height(), imgsz);
    let resized = image::imageops::resize(rgb, lb.new_w, lb.new_h, FilterType::Triangle);

    let mut input = Array4::<f32>::from_elem((1, 3, imgsz, imgsz), PAD_VALUE);
    let (ox, oy) = (lb.pad_x as usize, lb.pad_y as usize);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (ox + x as usize, oy + y as usize);
        input[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }
    (input, lb)
}

/// Decodes `[4 + num_classes, N]` candidates into boxes on the original image, then runs NMS.
pub(crate) fn postprocess(
    view: ArrayView2<f32>,
    orig_w: u32,
    orig_h: u32,
    letterbox: Letterbox,
    params: &YoloParams,
) -> Vec<Detection> {
    let num_candidates = view.shape()[1];
    let mut candidates = Vec::new();

    for i in 0..num_candidates {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, &max_score)) = scores
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if max_score > params.conf_threshold {
            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];

            let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
            let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);
            let det = Detection {
                x1,
                y1,
                x2,
                y2,
                score: max_score,
                class_id,
            };
            candidates.push(det.clipped(orig_w, orig_h));
        }
    }

    non_max_suppression(candidates, params.iou_threshold, params.max_detections)
}

/// Class-aware greedy NMS. Output is sorted by descending score.
pub(crate) fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::new();
    'outer: for det in detections {
        if kept.len() >= max_detections {
            break;
        }
        for k in &kept {
            if k.class_id == det.class_id && k.iou(&det) > iou_threshold {
                continue 'outer;
            }
        }
        kept.push(det);
    }
    kept
}
