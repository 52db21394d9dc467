use anyhow::Result;
use image::DynamicImage;
use usls::models::RTDETR;
use usls::{Config, Image};

/// Per-frame detection seam: one decoded frame in, that frame's
/// detections out.
pub trait Detector {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<usls::Hbb>>;
}

/// A wrapper around the USLS RT-DETR model that corrects for
/// aspect-ratio padding bugs in the underlying library, so boxes come
/// back in source pixel space.
pub struct ObjectDetector {
    model: RTDETR,
}

impl ObjectDetector {
    /// Load the model once; the same instance serves every video in the
    /// run.
    pub fn new(model_path: &str) -> Result<Self> {
        let config = Config::default()
            .with_model_file(model_path)
            .with_class_names(&usls::NAMES_COCO_80);

        let config = config.commit()?;
        let model = RTDETR::new(config)?;
        Ok(Self { model })
    }
}

impl Detector for ObjectDetector {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<usls::Hbb>> {
        let img_w = frame.width() as f32;
        let img_h = frame.height() as f32;

        // Correction factors for the library's square-padded inference space
        let (x_correction, y_correction) = if img_w > img_h {
            (img_w / img_h, 1.0)
        } else if img_h > img_w {
            (1.0, img_h / img_w)
        } else {
            (1.0, 1.0)
        };

        let images = vec![Image::from(frame.clone())];
        let results = self.model.forward(&images)?;

        let corrected: Vec<usls::Hbb> = results
            .into_iter()
            .next()
            .map(|y| {
                y.hbbs
                    .into_iter()
                    .map(|hbb| correct_hbb(hbb, x_correction, y_correction))
                    .collect()
            })
            .unwrap_or_default();

        Ok(corrected)
    }
}

fn correct_hbb(hbb: usls::Hbb, x_correction: f32, y_correction: f32) -> usls::Hbb {
    let x = hbb.xmin() * x_correction;
    let w = hbb.width() * x_correction;
    let y = hbb.ymin() * y_correction;
    let h = hbb.height() * y_correction;

    let mut new_hbb = usls::Hbb::default().with_xyxy(x, y, x + w, y + h);

    if let Some(conf) = hbb.confidence() {
        new_hbb = new_hbb.with_confidence(conf);
    }
    if let Some(id) = hbb.id() {
        new_hbb = new_hbb.with_id(id);
    }
    if let Some(name) = hbb.name() {
        new_hbb = new_hbb.with_name(name);
    }

    new_hbb
}
