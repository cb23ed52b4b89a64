use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};

use crate::{
    compositor::{composite, to_display},
    config::{AppConfig, DetectorConfig, DisplayConfig},
    error::CanvasError,
    gesture::{Gesture, GestureState, classify},
    pipeline::{
        CameraCapture, FrameSource, LandmarkProvider, OrtLandmarkProvider, draw_skeleton,
        probe_camera,
    },
    stroke::{BrushConfig, StrokeSession},
    types::{DisplayFrame, Frame, Rgb},
};

const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Requests from the UI, applied by the session loop between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Clear,
    SetColor(Rgb),
    SetBrushWidth(u32),
}

/// Status reported back to the UI.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Started,
    Gesture(GestureState),
    Failed(String),
    Stopped,
}

/// Result of one pass through the pipeline, before display conversion.
#[derive(Debug)]
pub struct FrameOutput {
    pub gesture: Gesture,
    pub composited: Frame,
}

/// Everything the loop needs to turn one captured frame into a composited one.
pub struct FramePipeline<P> {
    provider: P,
    stroke: StrokeSession,
    display: DisplayConfig,
}

impl<P: LandmarkProvider> FramePipeline<P> {
    pub fn new(provider: P, brush: BrushConfig, display: DisplayConfig) -> Self {
        Self {
            provider,
            stroke: StrokeSession::new(brush),
            display,
        }
    }

    pub fn stroke(&self) -> &StrokeSession {
        &self.stroke
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    pub fn handle(&mut self, command: SessionCommand) {
        let result = match command {
            SessionCommand::Clear => {
                self.stroke.clear();
                Ok(())
            }
            SessionCommand::SetColor(color) => self.stroke.set_color(color),
            SessionCommand::SetBrushWidth(width) => self.stroke.set_brush_width(width),
        };
        if let Err(err) = result {
            log::warn!("ignoring {command:?}: {err}");
        }
    }

    pub fn process(&mut self, mut frame: Frame) -> Result<FrameOutput> {
        self.stroke.prepare(frame.width, frame.height);

        let hand = self.provider.detect(&frame).unwrap_or_else(|err| {
            log::warn!("landmark detection failed: {err:?}");
            None
        });
        let gesture = classify(hand.as_ref());
        self.stroke.apply(gesture);

        if self.display.show_skeleton {
            if let Some(hand) = hand.as_ref() {
                draw_skeleton(&mut frame, hand);
            }
        }

        let canvas = self
            .stroke
            .canvas()
            .ok_or_else(|| anyhow!("canvas missing after prepare"))?;
        let composited = composite(&frame, canvas)?;

        Ok(FrameOutput {
            gesture,
            composited,
        })
    }
}

/// Channels and the stop flag shared between a session thread and its owner.
pub struct SessionLink {
    pub commands: Receiver<SessionCommand>,
    pub frames: Sender<DisplayFrame>,
    pub events: Sender<SessionEvent>,
    pub stop: Arc<AtomicBool>,
}

/// Runs until the stop flag is raised or the display side hangs up.
pub fn run_session_loop<S, P>(source: &mut S, pipeline: &mut FramePipeline<P>, link: &SessionLink)
where
    S: FrameSource,
    P: LandmarkProvider,
{
    let mut last_state = GestureState::Idle;

    while !link.stop.load(Ordering::Relaxed) {
        for command in link.commands.try_iter() {
            pipeline.handle(command);
        }

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("skipping frame: {err:?}");
                thread::sleep(READ_RETRY_DELAY);
                continue;
            }
        };
        let captured_at = frame.timestamp;

        let output = match pipeline.process(frame) {
            Ok(output) => output,
            Err(err) => {
                log::warn!("failed to composite frame: {err:?}");
                continue;
            }
        };

        if output.gesture.state != last_state {
            log::debug!(
                "gesture {} -> {} at {:?}",
                last_state.label(),
                output.gesture.state.label(),
                output.gesture.point
            );
            last_state = output.gesture.state;
            let _ = link.events.send(SessionEvent::Gesture(last_state));
        }

        let display = match to_display(
            &output.composited,
            pipeline.display.width,
            pipeline.display.height,
        ) {
            Ok(display) => display,
            Err(err) => {
                log::warn!("failed to prepare frame for display: {err:?}");
                continue;
            }
        };

        match link.frames.try_send(display) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                log::info!("display closed; ending session");
                break;
            }
        }
        log::trace!("frame done in {:?}", captured_at.elapsed());
    }
}

type BoxedProvider = Box<dyn LandmarkProvider>;

struct RunningSession {
    stop: Arc<AtomicBool>,
    commands: Sender<SessionCommand>,
    /// Yields the provider back once the loop is done.
    handle: JoinHandle<BoxedProvider>,
}

/// Start/stop/clear and brush settings, as driven by the UI. Brush settings
/// and the loaded landmark provider outlive individual sessions.
pub struct SessionControls {
    config: AppConfig,
    brush: BrushConfig,
    frames: Sender<DisplayFrame>,
    events: Sender<SessionEvent>,
    provider: Option<BoxedProvider>,
    running: Option<RunningSession>,
}

impl SessionControls {
    pub fn new(config: AppConfig, frames: Sender<DisplayFrame>) -> (Self, Receiver<SessionEvent>) {
        let (events, events_rx) = unbounded();
        let controls = Self {
            brush: config.brush,
            config,
            frames,
            events,
            provider: None,
            running: None,
        };
        (controls, events_rx)
    }

    /// Hands over an already loaded provider so the first start does not
    /// have to build one.
    pub fn set_provider(&mut self, provider: BoxedProvider) {
        self.provider = Some(provider);
    }

    pub fn brush(&self) -> BrushConfig {
        self.brush
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Probes the camera on the calling thread so a missing device surfaces
    /// here. The session thread then reopens it, and a failure there arrives
    /// as [`SessionEvent::Failed`]. Models are only loaded if no provider is
    /// cached from a previous session.
    pub fn start_session(&mut self) -> Result<()> {
        if self.is_running() {
            log::info!("session already running");
            return Ok(());
        }
        // Reap a session that ended on its own, reclaiming its provider.
        self.stop_session();

        let capture = self.config.capture.clone();
        probe_camera(&capture).context("cannot start session")?;
        let provider = self.cached_provider_or(|detector| {
            log::info!("loading hand landmark models");
            let provider: BoxedProvider = Box::new(
                OrtLandmarkProvider::new(detector).context("failed to load hand landmark models")?,
            );
            Ok(provider)
        })?;

        self.spawn_session(move || CameraCapture::open(&capture), provider)
    }

    fn cached_provider_or<B>(&mut self, build: B) -> Result<BoxedProvider>
    where
        B: FnOnce(&DetectorConfig) -> Result<BoxedProvider>,
    {
        match self.provider.take() {
            Some(provider) => Ok(provider),
            None => build(&self.config.detector),
        }
    }

    fn spawn_session<S, F>(&mut self, open_source: F, provider: BoxedProvider) -> Result<()>
    where
        S: FrameSource,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        self.stop_session();

        let stop = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = unbounded();
        let link = SessionLink {
            commands: command_rx,
            frames: self.frames.clone(),
            events: self.events.clone(),
            stop: stop.clone(),
        };
        let brush = self.brush;
        let display = self.config.display;

        let handle = thread::Builder::new()
            .name("air-canvas-session".into())
            .spawn(move || {
                // The camera handle is not Send, so it is reopened here.
                let mut source = match open_source() {
                    Ok(source) => source,
                    Err(err) => {
                        log::error!("failed to open frame source: {err:?}");
                        let _ = link.events.send(SessionEvent::Failed(format!("{err:#}")));
                        return provider;
                    }
                };

                let mut pipeline = FramePipeline::new(provider, brush, display);
                log::info!("session started");
                let _ = link.events.send(SessionEvent::Started);

                run_session_loop(&mut source, &mut pipeline, &link);

                drop(source);
                log::info!("session stopped");
                let _ = link.events.send(SessionEvent::Stopped);
                pipeline.into_provider()
            })
            .context("failed to spawn session thread")?;

        self.running = Some(RunningSession {
            stop,
            commands: command_tx,
            handle,
        });
        Ok(())
    }

    pub fn stop_session(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.stop.store(true, Ordering::Relaxed);
        match running.handle.join() {
            Ok(provider) => self.provider = Some(provider),
            Err(_) => log::error!("session thread panicked; landmark provider lost"),
        }
    }

    pub fn clear(&self) {
        self.send(SessionCommand::Clear);
    }

    pub fn set_color(&mut self, color: Rgb) -> Result<(), CanvasError> {
        self.brush.set_color(color)?;
        self.send(SessionCommand::SetColor(color));
        Ok(())
    }

    pub fn set_brush_width(&mut self, width: u32) -> Result<(), CanvasError> {
        self.brush.set_width(width)?;
        self.send(SessionCommand::SetBrushWidth(width));
        Ok(())
    }

    fn send(&self, command: SessionCommand) {
        if let Some(running) = self.running.as_ref() {
            if running.commands.send(command).is_err() {
                log::debug!("{command:?} dropped; session already ended");
            }
        }
    }
}

impl Drop for SessionControls {
    fn drop(&mut self) {
        self.stop_session();
    }
}
