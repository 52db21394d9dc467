use crate::error::ScanError;
use crate::pipeline::detection::Detector;
use crate::video::ffmpeg_reader::FfmpegReader;
use crate::video::FrameSource;
use anyhow::{Context, Result};
use std::path::Path;

/// Decides whether a single video contains the target object.
pub trait VideoClassifier {
    fn contains_target(&mut self, video: &Path) -> Result<bool>;
}

/// Classifier that decodes a video front to back and stops at the first
/// detection of the target class at or above the size threshold.
pub struct DetectionClassifier<D: Detector> {
    detector: D,
    target_class: String,
    size_threshold: f32,
}

impl<D: Detector> DetectionClassifier<D> {
    pub fn new(detector: D, target_class: &str, size_threshold: f32) -> Self {
        Self {
            detector,
            target_class: target_class.to_string(),
            size_threshold,
        }
    }
}

impl<D: Detector> VideoClassifier for DetectionClassifier<D> {
    fn contains_target(&mut self, video: &Path) -> Result<bool> {
        // The reader is dropped on return, so the decoding handle is
        // released even when scanning stops at an early frame.
        let mut frames = FfmpegReader::new(video).with_context(|| ScanError::UnreadableMedia {
            path: video.to_path_buf(),
        })?;

        scan_frames(
            &mut frames,
            &mut self.detector,
            &self.target_class,
            self.size_threshold,
        )
    }
}

/// Walk the frame stream and report whether any detection of
/// `target_class` reaches `size_threshold` in width or height.
///
/// Stops decoding as soon as one detection qualifies. Confidence is not
/// consulted.
pub fn scan_frames(
    frames: &mut dyn FrameSource,
    detector: &mut dyn Detector,
    target_class: &str,
    size_threshold: f32,
) -> Result<bool> {
    while let Some(frame) = frames.next_frame()? {
        let detections = detector.detect(&frame)?;
        let qualifying = detections
            .iter()
            .filter(|d| d.name().unwrap_or("") == target_class)
            .find(|d| d.width() >= size_threshold || d.height() >= size_threshold);

        if let Some(hit) = qualifying {
            tracing::debug!(
                "qualifying {} detection ({:.0}x{:.0})",
                target_class,
                hit.width(),
                hit.height()
            );
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use image::DynamicImage;

    /// Serves `frames` blank frames, then either ends the stream or, when
    /// `strict` is set, errors to flag a read past the scripted end.
    struct ScriptedFrames {
        frames: usize,
        served: usize,
        strict: bool,
    }

    impl ScriptedFrames {
        fn new(frames: usize) -> Self {
            Self {
                frames,
                served: 0,
                strict: false,
            }
        }

        fn strict(frames: usize) -> Self {
            Self {
                frames,
                served: 0,
                strict: true,
            }
        }
    }

    impl FrameSource for ScriptedFrames {
        fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
            if self.served == self.frames {
                if self.strict {
                    return Err(anyhow!("frame requested past the scripted end"));
                }
                return Ok(None);
            }
            self.served += 1;
            Ok(Some(DynamicImage::new_rgb8(4, 4)))
        }
    }

    /// Returns a fixed detection list per frame index.
    struct ScriptedDetector {
        per_frame: Vec<Vec<usls::Hbb>>,
        calls: usize,
    }

    impl ScriptedDetector {
        fn new(per_frame: Vec<Vec<usls::Hbb>>) -> Self {
            Self {
                per_frame,
                calls: 0,
            }
        }
    }

    impl Detector for ScriptedDetector {
        fn detect(&mut self, _frame: &DynamicImage) -> Result<Vec<usls::Hbb>> {
            let detections = self.per_frame.get(self.calls).cloned().unwrap_or_default();
            self.calls += 1;
            Ok(detections)
        }
    }

    fn detection(name: &str, width: f32, height: f32) -> usls::Hbb {
        usls::Hbb::default()
            .with_xyxy(10.0, 20.0, 10.0 + width, 20.0 + height)
            .with_confidence(0.9)
            .with_id(0)
            .with_name(name)
    }

    #[test]
    fn test_positive_on_wide_person() {
        let mut frames = ScriptedFrames::new(1);
        let mut detector = ScriptedDetector::new(vec![vec![detection("person", 400.0, 50.0)]]);

        assert!(scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
    }

    #[test]
    fn test_positive_on_tall_person() {
        let mut frames = ScriptedFrames::new(1);
        let mut detector = ScriptedDetector::new(vec![vec![detection("person", 50.0, 400.0)]]);

        assert!(scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut frames = ScriptedFrames::new(1);
        let mut detector = ScriptedDetector::new(vec![vec![detection("person", 300.0, 10.0)]]);
        assert!(scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());

        let mut frames = ScriptedFrames::new(1);
        let mut detector = ScriptedDetector::new(vec![vec![detection("person", 299.0, 299.0)]]);
        assert!(!scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
    }

    #[test]
    fn test_other_classes_do_not_qualify() {
        let mut frames = ScriptedFrames::new(2);
        let mut detector = ScriptedDetector::new(vec![
            vec![detection("car", 400.0, 400.0)],
            vec![detection("truck", 500.0, 500.0)],
        ]);

        assert!(!scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
        assert_eq!(detector.calls, 2);
    }

    #[test]
    fn test_unnamed_detections_do_not_qualify() {
        let mut frames = ScriptedFrames::new(1);
        let unnamed = usls::Hbb::default().with_xyxy(0.0, 0.0, 400.0, 400.0);
        let mut detector = ScriptedDetector::new(vec![vec![unnamed]]);

        assert!(!scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
    }

    #[test]
    fn test_confidence_is_ignored() {
        let mut frames = ScriptedFrames::new(1);
        let faint = usls::Hbb::default()
            .with_xyxy(0.0, 0.0, 400.0, 40.0)
            .with_confidence(0.01)
            .with_name("person");
        let mut detector = ScriptedDetector::new(vec![vec![faint]]);

        assert!(scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
    }

    #[test]
    fn test_negative_when_stream_exhausts() {
        let mut frames = ScriptedFrames::new(3);
        let mut detector = ScriptedDetector::new(vec![
            Vec::new(),
            vec![detection("person", 50.0, 50.0)],
            Vec::new(),
        ]);

        assert!(!scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
        assert_eq!(detector.calls, 3);
    }

    #[test]
    fn test_stops_at_first_qualifying_frame() {
        // A strict source errors if the scan reads past the qualifying
        // frame, so continuing would fail this test.
        let mut frames = ScriptedFrames::strict(1);
        let mut detector = ScriptedDetector::new(vec![vec![
            detection("car", 500.0, 500.0),
            detection("person", 350.0, 80.0),
        ]]);

        assert!(scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
        assert_eq!(detector.calls, 1);
    }

    #[test]
    fn test_keeps_scanning_past_small_detections() {
        let mut frames = ScriptedFrames::new(3);
        let mut detector = ScriptedDetector::new(vec![
            vec![detection("person", 50.0, 50.0)],
            Vec::new(),
            vec![detection("person", 80.0, 310.0)],
        ]);

        assert!(scan_frames(&mut frames, &mut detector, "person", 300.0).unwrap());
        assert_eq!(detector.calls, 3);
    }

    #[test]
    fn test_frame_source_errors_propagate() {
        let mut frames = ScriptedFrames::strict(0);
        let mut detector = ScriptedDetector::new(Vec::new());

        assert!(scan_frames(&mut frames, &mut detector, "person", 300.0).is_err());
    }

    #[test]
    fn test_unreadable_video_maps_to_scan_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c_r.mp4");
        std::fs::write(&path, b"junk bytes, not an mp4").unwrap();

        let detector = ScriptedDetector::new(Vec::new());
        let mut classifier = DetectionClassifier::new(detector, "person", 300.0);

        let err = classifier.contains_target(&path).unwrap_err();
        match err.downcast_ref::<ScanError>() {
            Some(ScanError::UnreadableMedia { path: p }) => assert_eq!(p, &path),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
