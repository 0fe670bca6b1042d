use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver};

use crate::capture::domain::video_source::VideoSource;
use crate::detection::domain::capability::Capability;
use crate::detection::domain::category::Category;
use crate::detection::domain::detection_set::{DetectionSet, Detections};
use crate::pump::infrastructure::detection_worker::{DetectionWorker, PassOutcome};
use crate::pump::pass_logger::{NullPassLogger, PassLogger};
use crate::pump::pump_error::PumpError;
use crate::pump::pump_stats::PumpStats;
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::frame::Frame;

/// What a single refresh tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new detection pass was handed to every worker.
    Started(u64),
    /// A pass is still in flight; the tick is dropped.
    DroppedBusy,
    /// The source is paused.
    DroppedPaused,
    /// The source has not produced its first frame yet.
    DroppedNoFrame,
}

/// Result of a rendered pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PassSummary {
    pub pass_id: u64,
    pub frame_index: usize,
    pub detections: DetectionSet,
    pub failed: Vec<Category>,
    pub elapsed: Duration,
}

struct InFlightPass {
    id: u64,
    frame: Arc<Frame>,
    pending: BTreeSet<Category>,
    detections: DetectionSet,
    failed: Vec<Category>,
    dropped_ticks: u64,
    started: Instant,
}

/// Single-flight detection loop.
///
/// Every tick either starts a pass on the current frame or is dropped. A
/// pass fans the frame out to one worker per capability; when all of them
/// have answered the surface is redrawn once and the next tick may start
/// another pass. Ticks arriving in between are never queued.
pub struct FramePump {
    source: Box<dyn VideoSource>,
    workers: Vec<DetectionWorker>,
    outcomes: Receiver<PassOutcome>,
    surface: Box<dyn RenderSurface>,
    renderer: OverlayRenderer,
    logger: Box<dyn PassLogger>,
    in_flight: Option<InFlightPass>,
    next_pass_id: u64,
    stats: PumpStats,
}

impl FramePump {
    pub fn new(
        source: Box<dyn VideoSource>,
        capabilities: Vec<Capability>,
        surface: Box<dyn RenderSurface>,
        renderer: OverlayRenderer,
    ) -> Result<Self, PumpError> {
        if capabilities.is_empty() {
            return Err(PumpError::NoCapabilities);
        }
        let mut seen = BTreeSet::new();
        for capability in &capabilities {
            if !seen.insert(capability.category()) {
                return Err(PumpError::DuplicateCapability(capability.category()));
            }
        }

        let (outcome_tx, outcomes) = crossbeam_channel::bounded(capabilities.len());
        let workers = capabilities
            .into_iter()
            .map(|capability| DetectionWorker::spawn(capability, outcome_tx.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source,
            workers,
            outcomes,
            surface,
            renderer,
            logger: Box::new(NullPassLogger),
            in_flight: None,
            next_pass_id: 0,
            stats: PumpStats::default(),
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn PassLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// True exactly while a pass is in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn stats(&self) -> &PumpStats {
        &self.stats
    }

    pub fn categories(&self) -> Vec<Category> {
        self.workers.iter().map(|w| w.category()).collect()
    }

    pub fn surface(&self) -> &dyn RenderSurface {
        self.surface.as_ref()
    }

    /// Per-refresh entry point.
    pub fn tick(&mut self) -> Result<TickOutcome, PumpError> {
        self.stats.ticks += 1;

        if let Some(pass) = self.in_flight.as_mut() {
            pass.dropped_ticks += 1;
            self.stats.dropped_busy += 1;
            return Ok(TickOutcome::DroppedBusy);
        }
        if self.source.is_paused() {
            self.stats.dropped_paused += 1;
            return Ok(TickOutcome::DroppedPaused);
        }
        let Some(frame) = self.source.current_frame() else {
            self.stats.dropped_no_frame += 1;
            return Ok(TickOutcome::DroppedNoFrame);
        };

        let id = self.next_pass_id;
        self.next_pass_id += 1;
        for worker in &self.workers {
            worker.submit(id, Arc::clone(&frame))?;
        }
        log::trace!("pass {id} started on frame {}", frame.index());

        self.in_flight = Some(InFlightPass {
            id,
            frame,
            pending: self.workers.iter().map(|w| w.category()).collect(),
            detections: DetectionSet::new(),
            failed: Vec::new(),
            dropped_ticks: 0,
            started: Instant::now(),
        });
        self.stats.passes_started += 1;
        Ok(TickOutcome::Started(id))
    }

    /// Folds one worker outcome into the in-flight pass.
    ///
    /// A failed outcome leaves its category empty. Once every worker has
    /// answered, the pass is rendered, the surface is flushed and the pump
    /// becomes idle again.
    pub fn complete(&mut self, outcome: PassOutcome) -> Result<Option<PassSummary>, PumpError> {
        let Some(pass) = self.in_flight.as_mut() else {
            log::warn!(
                "ignoring {} outcome for pass {}: no pass in flight",
                outcome.category,
                outcome.pass_id
            );
            return Ok(None);
        };
        if outcome.pass_id != pass.id {
            log::warn!(
                "ignoring stale {} outcome for pass {} (in flight: {})",
                outcome.category,
                outcome.pass_id,
                pass.id
            );
            return Ok(None);
        }
        if !pass.pending.remove(&outcome.category) {
            log::warn!(
                "ignoring duplicate {} outcome for pass {}",
                outcome.category,
                pass.id
            );
            return Ok(None);
        }

        let category = outcome.category;
        self.logger.timing(
            &format!("detect_{category}"),
            outcome.elapsed.as_secs_f64() * 1000.0,
        );
        match outcome.result {
            Ok(detections) if detections.category() == category => pass.detections.insert(detections),
            Ok(detections) => {
                log::warn!(
                    "{category} worker returned {} results; treating as empty",
                    detections.category()
                );
                pass.failed.push(category);
                self.stats.record_failure(category);
                pass.detections.insert(Detections::empty(category));
            }
            Err(e) => {
                log::warn!("{category} detection failed for pass {}: {e}", pass.id);
                pass.failed.push(category);
                self.stats.record_failure(category);
                pass.detections.insert(Detections::empty(category));
            }
        }

        if !pass.pending.is_empty() {
            return Ok(None);
        }
        match self.in_flight.take() {
            Some(pass) => self.finish(pass).map(Some),
            None => Ok(None),
        }
    }

    /// Blocks until the next worker outcome arrives and folds it in.
    pub fn process_next_outcome(&mut self) -> Result<Option<PassSummary>, PumpError> {
        let outcome = self.outcomes.recv().map_err(|_| PumpError::WorkerLost)?;
        self.complete(outcome)
    }

    /// Drives the pump until `stop` is raised or `ticks` closes.
    ///
    /// Every tick is offered to [`tick`](Self::tick) regardless of the busy
    /// state. On exit, an in-flight pass is allowed to finish and render.
    pub fn run(&mut self, ticks: &Receiver<Instant>, stop: &AtomicBool) -> Result<PumpStats, PumpError> {
        let outcomes = self.outcomes.clone();
        self.logger.info(&format!(
            "Pump running with {} capabilities",
            self.workers.len()
        ));

        while !stop.load(Ordering::SeqCst) {
            select! {
                recv(ticks) -> tick => match tick {
                    Ok(_) => {
                        self.tick()?;
                    }
                    Err(_) => break,
                },
                recv(outcomes) -> outcome => {
                    let outcome = outcome.map_err(|_| PumpError::WorkerLost)?;
                    self.complete(outcome)?;
                }
            }
        }

        self.drain()?;
        self.logger.summary();
        Ok(self.stats.clone())
    }

    /// Waits for the in-flight pass, if any, to finish rendering.
    pub fn drain(&mut self) -> Result<(), PumpError> {
        while self.in_flight.is_some() {
            self.process_next_outcome()?;
        }
        Ok(())
    }

    fn finish(&mut self, pass: InFlightPass) -> Result<PassSummary, PumpError> {
        let render_start = Instant::now();
        self.renderer
            .render(self.surface.as_mut(), &pass.frame, &pass.detections);
        self.surface.flush().map_err(PumpError::Present)?;
        self.stats.passes_completed += 1;

        let shapes: usize = Category::PRIORITY
            .iter()
            .map(|c| pass.detections.count(*c))
            .sum();
        let elapsed = pass.started.elapsed();
        self.logger
            .timing("render", render_start.elapsed().as_secs_f64() * 1000.0);
        self.logger.timing("pass", elapsed.as_secs_f64() * 1000.0);
        self.logger
            .metric("dropped_busy_ticks", pass.dropped_ticks as f64);
        self.logger.metric("shapes", shapes as f64);
        self.logger.pass_completed(pass.id, shapes);

        Ok(PassSummary {
            pass_id: pass.id,
            frame_index: pass.frame.index(),
            detections: pass.detections,
            failed: pass.failed,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detected_shape::{DetectedBarcode, DetectedFace, DetectedText};
    use crate::detection::domain::shape_detector::{
        BarcodeDetector, DetectionError, FaceDetector, TextDetector,
    };
    use crate::rendering::domain::render_surface::{Color, Font, PresentError};
    use crate::rendering::infrastructure::recording_surface::{DrawCommand, RecordingSurface};
    use crate::shared::geometry::BoundingBox;
    use crossbeam_channel::Sender;
    use std::sync::Mutex;

    struct FakeSource {
        paused: Arc<AtomicBool>,
        frame: Arc<Mutex<Option<Arc<Frame>>>>,
    }

    impl VideoSource for FakeSource {
        fn dimensions(&self) -> Option<(u32, u32)> {
            self.frame
                .lock()
                .unwrap()
                .as_ref()
                .map(|f| (f.width(), f.height()))
        }

        fn is_paused(&self) -> bool {
            self.paused.load(Ordering::SeqCst)
        }

        fn current_frame(&self) -> Option<Arc<Frame>> {
            self.frame.lock().unwrap().clone()
        }
    }

    struct SourceControl {
        paused: Arc<AtomicBool>,
        frame: Arc<Mutex<Option<Arc<Frame>>>>,
    }

    fn fake_source(with_frame: bool) -> (Box<dyn VideoSource>, SourceControl) {
        let paused = Arc::new(AtomicBool::new(false));
        let frame = Arc::new(Mutex::new(with_frame.then(|| test_frame(0))));
        let source = FakeSource {
            paused: Arc::clone(&paused),
            frame: Arc::clone(&frame),
        };
        (Box::new(source), SourceControl { paused, frame })
    }

    fn test_frame(index: usize) -> Arc<Frame> {
        Arc::new(Frame::new(vec![0u8; 8 * 6 * 3], 8, 6, index))
    }

    /// Face detector that waits for a release signal before answering.
    struct GatedFaceDetector {
        gate: Receiver<()>,
    }

    impl FaceDetector for GatedFaceDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError> {
            let _ = self.gate.recv();
            Ok(vec![DetectedFace {
                bounding_box: BoundingBox::new(1.0, 1.0, 4.0, 3.0),
                landmarks: Vec::new(),
            }])
        }
    }

    fn gated_face() -> (Capability, Sender<()>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Capability::Face(Box::new(GatedFaceDetector { gate: rx })), tx)
    }

    struct StubTextDetector;

    impl TextDetector for StubTextDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedText>, DetectionError> {
            Ok(vec![DetectedText {
                bounding_box: BoundingBox::new(0.0, 0.0, 5.0, 2.0),
                raw_value: "ABC".to_string(),
                corner_points: Vec::new(),
            }])
        }
    }

    struct FailingBarcodeDetector;

    impl BarcodeDetector for FailingBarcodeDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedBarcode>, DetectionError> {
            Err(DetectionError::Backend("scanner offline".into()))
        }
    }

    struct PanickingBarcodeDetector;

    impl BarcodeDetector for PanickingBarcodeDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedBarcode>, DetectionError> {
            panic!("decoder crashed");
        }
    }

    /// Surface whose flush always fails.
    struct BrokenSurface;

    impl RenderSurface for BrokenSurface {
        fn width(&self) -> u32 {
            8
        }
        fn height(&self) -> u32 {
            6
        }
        fn resize(&mut self, _width: u32, _height: u32) {}
        fn clear_rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {}
        fn draw_image(&mut self, _frame: &Frame, _x: f64, _y: f64, _width: f64, _height: f64) {}
        fn set_stroke_style(&mut self, _color: Color) {}
        fn set_fill_style(&mut self, _color: Color) {}
        fn set_font(&mut self, _font: &Font) {}
        fn set_line_width(&mut self, _width: f64) {}
        fn begin_path(&mut self) {}
        fn close_path(&mut self) {}
        fn rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {}
        fn move_to(&mut self, _x: f64, _y: f64) {}
        fn line_to(&mut self, _x: f64, _y: f64) {}
        fn arc(&mut self, _x: f64, _y: f64, _radius: f64, _start: f64, _end: f64) {}
        fn fill_text(&mut self, _text: &str, _x: f64, _y: f64) {}
        fn stroke(&mut self) {}
        fn fill(&mut self) {}
        fn flush(&mut self) -> Result<(), PresentError> {
            Err("display went away".into())
        }
    }

    fn pump_with(
        source: Box<dyn VideoSource>,
        capabilities: Vec<Capability>,
    ) -> (FramePump, Arc<Mutex<Vec<DrawCommand>>>) {
        let surface = RecordingSurface::new(8, 6);
        let commands = surface.commands_handle();
        let pump = FramePump::new(
            source,
            capabilities,
            Box::new(surface),
            OverlayRenderer::default(),
        )
        .unwrap();
        (pump, commands)
    }

    fn count(commands: &Arc<Mutex<Vec<DrawCommand>>>, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        commands.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn complete_pass(pump: &mut FramePump) -> PassSummary {
        loop {
            if let Some(summary) = pump.process_next_outcome().unwrap() {
                return summary;
            }
        }
    }

    #[test]
    fn test_new_rejects_empty_capabilities() {
        let (source, _control) = fake_source(true);
        let result = FramePump::new(
            source,
            Vec::new(),
            Box::new(RecordingSurface::new(8, 6)),
            OverlayRenderer::default(),
        );
        assert!(matches!(result, Err(PumpError::NoCapabilities)));
    }

    #[test]
    fn test_new_rejects_duplicate_capabilities() {
        let (source, _control) = fake_source(true);
        let result = FramePump::new(
            source,
            vec![
                Capability::Text(Box::new(StubTextDetector)),
                Capability::Text(Box::new(StubTextDetector)),
            ],
            Box::new(RecordingSurface::new(8, 6)),
            OverlayRenderer::default(),
        );
        assert!(matches!(
            result,
            Err(PumpError::DuplicateCapability(Category::Text))
        ));
    }

    #[test]
    fn test_busy_ticks_are_dropped() {
        let (source, _control) = fake_source(true);
        let (face, release) = gated_face();
        let (mut pump, commands) = pump_with(source, vec![face]);

        assert_eq!(pump.tick().unwrap(), TickOutcome::Started(0));
        assert!(pump.is_busy());
        assert_eq!(pump.tick().unwrap(), TickOutcome::DroppedBusy);
        assert_eq!(pump.tick().unwrap(), TickOutcome::DroppedBusy);
        assert_eq!(count(&commands, |c| matches!(c, DrawCommand::ClearRect { .. })), 0);

        release.send(()).unwrap();
        let summary = complete_pass(&mut pump);
        assert_eq!(summary.pass_id, 0);
        assert_eq!(summary.detections.faces.len(), 1);
        assert!(!pump.is_busy());

        release.send(()).unwrap();
        assert_eq!(pump.tick().unwrap(), TickOutcome::Started(1));
        complete_pass(&mut pump);

        let stats = pump.stats();
        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.passes_started, 2);
        assert_eq!(stats.passes_completed, 2);
        assert_eq!(stats.dropped_busy, 2);
    }

    #[test]
    fn test_paused_ticks_are_dropped() {
        let (source, control) = fake_source(true);
        let (mut pump, commands) =
            pump_with(source, vec![Capability::Text(Box::new(StubTextDetector))]);

        control.paused.store(true, Ordering::SeqCst);
        assert_eq!(pump.tick().unwrap(), TickOutcome::DroppedPaused);
        assert!(!pump.is_busy());
        assert_eq!(pump.stats().dropped_paused, 1);
        assert!(commands.lock().unwrap().is_empty());

        control.paused.store(false, Ordering::SeqCst);
        assert_eq!(pump.tick().unwrap(), TickOutcome::Started(0));
    }

    #[test]
    fn test_tick_without_frame_is_dropped() {
        let (source, control) = fake_source(false);
        let (mut pump, _commands) =
            pump_with(source, vec![Capability::Text(Box::new(StubTextDetector))]);

        assert_eq!(pump.tick().unwrap(), TickOutcome::DroppedNoFrame);
        assert_eq!(pump.stats().dropped_no_frame, 1);

        *control.frame.lock().unwrap() = Some(test_frame(3));
        assert_eq!(pump.tick().unwrap(), TickOutcome::Started(0));
        assert_eq!(complete_pass(&mut pump).frame_index, 3);
    }

    #[test]
    fn test_completed_pass_clears_and_draws_once_then_flushes() {
        let (source, _control) = fake_source(true);
        let (mut pump, commands) = pump_with(
            source,
            vec![
                Capability::Text(Box::new(StubTextDetector)),
                Capability::Barcode(Box::new(FailingBarcodeDetector)),
            ],
        );

        pump.tick().unwrap();
        complete_pass(&mut pump);

        assert_eq!(count(&commands, |c| matches!(c, DrawCommand::ClearRect { .. })), 1);
        assert_eq!(count(&commands, |c| matches!(c, DrawCommand::DrawImage { .. })), 1);
        assert_eq!(count(&commands, |c| matches!(c, DrawCommand::Flush)), 1);
        assert!(matches!(
            commands.lock().unwrap().last(),
            Some(DrawCommand::Flush)
        ));
    }

    #[test]
    fn test_failing_capability_yields_empty_category() {
        let (source, _control) = fake_source(true);
        let (mut pump, commands) = pump_with(
            source,
            vec![
                Capability::Text(Box::new(StubTextDetector)),
                Capability::Barcode(Box::new(FailingBarcodeDetector)),
            ],
        );

        pump.tick().unwrap();
        let summary = complete_pass(&mut pump);

        assert_eq!(summary.detections.texts.len(), 1);
        assert!(summary.detections.barcodes.is_empty());
        assert_eq!(summary.failed, vec![Category::Barcode]);
        assert_eq!(pump.stats().failures_for(Category::Barcode), 1);
        let labels = count(&commands, |c| {
            matches!(c, DrawCommand::FillText { text, .. } if text == "ABC")
        });
        assert_eq!(labels, 1);
    }

    #[test]
    fn test_panicking_capability_does_not_wedge_pump() {
        let (source, _control) = fake_source(true);
        let (mut pump, _commands) = pump_with(
            source,
            vec![
                Capability::Text(Box::new(StubTextDetector)),
                Capability::Barcode(Box::new(PanickingBarcodeDetector)),
            ],
        );

        for expected in 0..3 {
            assert_eq!(pump.tick().unwrap(), TickOutcome::Started(expected));
            let summary = complete_pass(&mut pump);
            assert_eq!(summary.failed, vec![Category::Barcode]);
            assert!(!pump.is_busy());
        }
        assert_eq!(pump.stats().failures_for(Category::Barcode), 3);
    }

    #[test]
    fn test_stale_and_duplicate_outcomes_are_ignored() {
        let (source, _control) = fake_source(true);
        let (face, release) = gated_face();
        let (mut pump, _commands) = pump_with(
            source,
            vec![face, Capability::Text(Box::new(StubTextDetector))],
        );

        pump.tick().unwrap();
        let stale = PassOutcome {
            pass_id: 41,
            category: Category::Face,
            result: Ok(Detections::Faces(Vec::new())),
            elapsed: Duration::ZERO,
        };
        assert_eq!(pump.complete(stale).unwrap(), None);

        // The text worker answers without waiting.
        assert_eq!(pump.process_next_outcome().unwrap(), None);
        let duplicate = PassOutcome {
            pass_id: 0,
            category: Category::Text,
            result: Ok(Detections::Texts(Vec::new())),
            elapsed: Duration::ZERO,
        };
        assert_eq!(pump.complete(duplicate).unwrap(), None);
        assert!(pump.is_busy());

        release.send(()).unwrap();
        let summary = complete_pass(&mut pump);
        assert_eq!(summary.detections.texts.len(), 1);
    }

    #[test]
    fn test_outcome_without_pass_is_ignored() {
        let (source, _control) = fake_source(true);
        let (mut pump, commands) =
            pump_with(source, vec![Capability::Text(Box::new(StubTextDetector))]);
        let outcome = PassOutcome {
            pass_id: 0,
            category: Category::Text,
            result: Ok(Detections::Texts(Vec::new())),
            elapsed: Duration::ZERO,
        };
        assert_eq!(pump.complete(outcome).unwrap(), None);
        assert!(commands.lock().unwrap().is_empty());
    }

    #[test]
    fn test_flush_failure_is_fatal() {
        let (source, _control) = fake_source(true);
        let mut pump = FramePump::new(
            source,
            vec![Capability::Text(Box::new(StubTextDetector))],
            Box::new(BrokenSurface),
            OverlayRenderer::default(),
        )
        .unwrap();

        pump.tick().unwrap();
        assert!(matches!(
            pump.process_next_outcome(),
            Err(PumpError::Present(_))
        ));
    }

    #[test]
    fn test_run_stops_on_closed_ticks_and_drains_in_flight_pass() {
        let (source, _control) = fake_source(true);
        let (face, release) = gated_face();
        let (mut pump, commands) = pump_with(source, vec![face]);

        let (tick_tx, tick_rx) = crossbeam_channel::unbounded();
        tick_tx.send(Instant::now()).unwrap();
        drop(tick_tx);
        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            release.send(()).unwrap();
        });

        let stop = AtomicBool::new(false);
        let stats = pump.run(&tick_rx, &stop).unwrap();
        releaser.join().unwrap();

        assert_eq!(stats.passes_started, 1);
        assert_eq!(stats.passes_completed, 1);
        assert!(!pump.is_busy());
        assert_eq!(count(&commands, |c| matches!(c, DrawCommand::Flush)), 1);
    }

    #[test]
    fn test_run_returns_immediately_when_stopped() {
        let (source, _control) = fake_source(true);
        let (mut pump, _commands) =
            pump_with(source, vec![Capability::Text(Box::new(StubTextDetector))]);
        let ticks = crossbeam_channel::tick(Duration::from_millis(1));
        let stop = AtomicBool::new(true);

        let stats = pump.run(&ticks, &stop).unwrap();
        assert_eq!(stats, PumpStats::default());
    }

    #[test]
    fn test_run_with_live_ticks_until_stopped() {
        let (source, _control) = fake_source(true);
        let (mut pump, _commands) =
            pump_with(source, vec![Capability::Text(Box::new(StubTextDetector))]);
        let ticks = crossbeam_channel::tick(Duration::from_millis(2));
        let stop = Arc::new(AtomicBool::new(false));

        let stopper = {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(60));
                stop.store(true, Ordering::SeqCst);
            })
        };
        let stats = pump.run(&ticks, &stop).unwrap();
        stopper.join().unwrap();

        assert!(stats.passes_completed >= 1);
        assert_eq!(stats.passes_started, stats.passes_completed);
        assert!(!pump.is_busy());
    }
}
