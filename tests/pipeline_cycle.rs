//! End-to-end pipeline cycles with scripted sources and backends.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use depthfuse::{
    pipeline, ClassLabels, ColorFrame, DepthFrame, DetectionParams, DetectorBackend, FramePair,
    FrameSource, Observation, Presenter, RawPrediction, StubBackend,
};

/// Replays a fixed acquisition script; raises the shared stop flag once the
/// script drains so the loop winds down after presenting the last cycle.
struct ScriptedSource {
    script: VecDeque<Option<FramePair>>,
    stop: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl ScriptedSource {
    fn new(script: Vec<Option<FramePair>>, stop: Arc<AtomicBool>) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                script: script.into(),
                stop,
                closed: closed.clone(),
            },
            closed,
        )
    }
}

impl FrameSource for ScriptedSource {
    fn next_frames(&mut self, _timeout: Duration) -> Result<Option<FramePair>> {
        let item = self.script.pop_front().unwrap_or(None);
        if self.script.is_empty() {
            self.stop.store(true, Ordering::Relaxed);
        }
        Ok(item)
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

/// Records what each presented cycle delivered.
#[derive(Default)]
struct CollectingPresenter {
    cycles: Vec<Vec<Observation>>,
    previews_seen: usize,
}

impl Presenter for CollectingPresenter {
    fn render(
        &mut self,
        _color: &ColorFrame,
        observations: &[Observation],
        depth_preview: Option<&depthfuse::DepthPreview>,
    ) -> Result<()> {
        self.cycles.push(observations.to_vec());
        if depth_preview.is_some() {
            self.previews_seen += 1;
        }
        Ok(())
    }
}

fn color_640x480() -> ColorFrame {
    ColorFrame::new(vec![0u8; 640 * 480 * 3], 640, 480).unwrap()
}

fn uniform_depth(raw: u16) -> DepthFrame {
    DepthFrame::new(vec![raw; 640 * 480], 640, 480).unwrap()
}

fn pair_with_depth(raw: u16, depth_scale: f32) -> FramePair {
    FramePair {
        color: color_640x480(),
        depth: Some(uniform_depth(raw)),
        depth_scale,
    }
}

fn pair_without_depth() -> FramePair {
    FramePair {
        color: color_640x480(),
        depth: None,
        depth_scale: 0.001,
    }
}

fn class3_center_box() -> RawPrediction {
    RawPrediction {
        bbox: [0.5, 0.5, 0.2, 0.2],
        objectness: 0.9,
        class_scores: vec![0.0, 0.0, 0.0, 0.9],
    }
}

fn coco_subset() -> ClassLabels {
    ClassLabels::parse("person\nbicycle\ncar\nmotorbike").unwrap()
}

#[test]
fn full_cycle_produces_labeled_distance_annotated_observation() -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let (mut source, closed) =
        ScriptedSource::new(vec![Some(pair_with_depth(1000, 0.001))], stop.clone());
    let mut backend = StubBackend::new().with_fallback(vec![class3_center_box()]);
    let mut presenter = CollectingPresenter::default();
    let labels = coco_subset();
    let params = DetectionParams::default();

    let stats = pipeline::run(
        &mut source,
        &mut backend,
        &mut presenter,
        &labels,
        &params,
        Duration::from_millis(10),
        &stop,
    )?;

    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.observations, 1);
    assert_eq!(presenter.cycles.len(), 1);
    assert_eq!(presenter.previews_seen, 1);

    let obs = &presenter.cycles[0][0];
    assert_eq!(obs.class_id, 3);
    assert_eq!(obs.confidence, 0.9);
    assert_eq!(obs.rect.left, 256);
    assert_eq!(obs.rect.top, 192);
    assert_eq!(obs.rect.width, 128);
    assert_eq!(obs.rect.height, 96);
    assert_eq!((obs.anchor_x, obs.anchor_y), (320, 240));
    assert_eq!(obs.distance_m, Some(1.0));

    assert!(closed.load(Ordering::Relaxed), "source must be released");
    Ok(())
}

#[test]
fn overlapping_candidates_collapse_to_the_stronger_one() -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let (mut source, _closed) =
        ScriptedSource::new(vec![Some(pair_with_depth(500, 0.001))], stop.clone());
    // Two near-identical boxes for the same object, IoU well above 0.4.
    let mut backend = StubBackend::new().with_fallback(vec![
        RawPrediction {
            bbox: [0.5, 0.5, 0.2, 0.2],
            objectness: 0.9,
            class_scores: vec![0.9],
        },
        RawPrediction {
            bbox: [0.505, 0.5, 0.2, 0.2],
            objectness: 0.9,
            class_scores: vec![0.6],
        },
    ]);
    let mut presenter = CollectingPresenter::default();
    let labels = ClassLabels::parse("person").unwrap();
    let params = DetectionParams::default();

    let stats = pipeline::run(
        &mut source,
        &mut backend,
        &mut presenter,
        &labels,
        &params,
        Duration::from_millis(10),
        &stop,
    )?;

    assert_eq!(stats.observations, 1);
    assert_eq!(presenter.cycles[0][0].confidence, 0.9);
    Ok(())
}

#[test]
fn empty_acquisition_skips_the_cycle_and_continues() -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let (mut source, closed) = ScriptedSource::new(
        vec![None, Some(pair_with_depth(1000, 0.001))],
        stop.clone(),
    );
    let mut backend = StubBackend::new().with_fallback(vec![class3_center_box()]);
    let mut presenter = CollectingPresenter::default();
    let labels = coco_subset();
    let params = DetectionParams::default();

    let stats = pipeline::run(
        &mut source,
        &mut backend,
        &mut presenter,
        &labels,
        &params,
        Duration::from_millis(10),
        &stop,
    )?;

    // The miss produced no observations and no presentation; the next
    // acquisition proceeded normally.
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.cycles, 1);
    assert_eq!(presenter.cycles.len(), 1);
    assert!(closed.load(Ordering::Relaxed));
    Ok(())
}

#[test]
fn missing_depth_yields_observations_without_distance() -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let (mut source, _closed) = ScriptedSource::new(vec![Some(pair_without_depth())], stop.clone());
    let mut backend = StubBackend::new().with_fallback(vec![class3_center_box()]);
    let mut presenter = CollectingPresenter::default();
    let labels = coco_subset();
    let params = DetectionParams::default();

    pipeline::run(
        &mut source,
        &mut backend,
        &mut presenter,
        &labels,
        &params,
        Duration::from_millis(10),
        &stop,
    )?;

    let obs = &presenter.cycles[0][0];
    assert_eq!(obs.distance_m, None);
    assert_eq!(presenter.previews_seen, 0);
    Ok(())
}

#[test]
fn label_table_mismatch_is_fatal_but_still_releases_the_camera() {
    let stop = Arc::new(AtomicBool::new(false));
    let (mut source, closed) =
        ScriptedSource::new(vec![Some(pair_with_depth(1000, 0.001))], stop.clone());
    // Class id 3 against a two-entry label table.
    let mut backend = StubBackend::new().with_fallback(vec![class3_center_box()]);
    let mut presenter = CollectingPresenter::default();
    let labels = ClassLabels::parse("person\nbicycle").unwrap();
    let params = DetectionParams::default();

    let err = pipeline::run(
        &mut source,
        &mut backend,
        &mut presenter,
        &labels,
        &params,
        Duration::from_millis(10),
        &stop,
    )
    .unwrap_err();

    assert!(err.to_string().contains("out of range"));
    assert!(closed.load(Ordering::Relaxed), "teardown on the error path");
}

#[test]
fn detector_name_is_visible_through_the_trait_object() {
    let backend: Box<dyn DetectorBackend> = Box::new(StubBackend::new());
    assert_eq!(backend.name(), "stub");
}
