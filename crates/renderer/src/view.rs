use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::frame::{seconds_from_timestamp, FrameLoop, LoopState};
use crate::input::InputTracker;
use crate::pipeline::{compile_sources, ShaderProgram, ShaderSources};
use crate::surface::{FrameError, RenderBackend, SurfaceManager, QUAD_VERTEX_COUNT};
use crate::types::{Offset, ViewportSize, DEFAULT_DAMPING};
use crate::uniforms::{UniformBlock, OFFSET, RESOLUTION, TIME};
use crate::wake::BoxedWakeLock;

/// The page-level surroundings of a mounted view: the viewport, presentation
/// state and the vsync-aligned tick scheduler.
pub trait PresentationHost {
    fn viewport(&self) -> ViewportSize;
    /// Hides the pointer and takes over the screen.
    fn enter_presentation(&mut self);
    /// Restores what `enter_presentation` changed.
    fn exit_presentation(&mut self);
    /// Schedules one tick on the next display refresh.
    fn request_tick(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    Resize,
    PointerMove,
    Visibility,
}

/// Which host events the view currently reacts to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listeners {
    registered: Vec<Listener>,
}

impl Listeners {
    fn register_all(&mut self) {
        self.registered = vec![Listener::Resize, Listener::PointerMove, Listener::Visibility];
    }

    fn clear(&mut self) {
        self.registered.clear();
    }

    pub fn is_registered(&self, listener: Listener) -> bool {
        self.registered.contains(&listener)
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("graphics context unavailable: {0:#}")]
    ContextUnavailable(anyhow::Error),
}

pub struct ViewOptions {
    /// Scale applied to the pointer offset at upload.
    pub damping: f64,
    pub wake_lock: Option<BoxedWakeLock>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            wake_lock: None,
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Uniforms uploaded and the quad drawn.
    Rendered,
    /// No surface, no linked program or an empty viewport; nothing drawn,
    /// nothing rescheduled.
    Blank,
    /// The view was torn down.
    Stopped,
    /// The frame was dropped.
    Skipped(FrameError),
}

/// A fullscreen animated pattern bound to a host.
///
/// Mounting never fails: a missing graphics context or a shader that does
/// not compile leaves a blank view that still tears down cleanly.
pub struct PatternView<B: RenderBackend, H: PresentationHost> {
    host: H,
    surface: Option<SurfaceManager<B>>,
    program: Option<ShaderProgram>,
    uniforms: Option<UniformBlock>,
    sources: Arc<ShaderSources>,
    viewport: ViewportSize,
    input: InputTracker,
    damping: f64,
    frame_loop: FrameLoop,
    listeners: Listeners,
    wake_lock: Option<BoxedWakeLock>,
    visible: bool,
}

impl<B: RenderBackend, H: PresentationHost> PatternView<B, H> {
    pub fn mount(
        mut host: H,
        backend: Result<B, ViewError>,
        sources: Arc<ShaderSources>,
        options: ViewOptions,
    ) -> Self {
        let mut listeners = Listeners::default();
        listeners.register_all();
        host.enter_presentation();
        let viewport = host.viewport();

        let mut surface = match backend {
            Ok(backend) => Some(SurfaceManager::new(backend, viewport)),
            Err(err) => {
                error!(error = %err, "rendering disabled");
                None
            }
        };

        let viewport = surface.as_ref().map_or(viewport, SurfaceManager::size);

        let mut program = None;
        if let Some(surface) = surface.as_mut() {
            if let Err(err) = surface.backend_mut().clear() {
                warn!(error = %err, "failed to clear surface");
            }
            program = match compile_sources(&sources) {
                Ok(compiled) => match surface.backend_mut().link(&compiled) {
                    Ok(()) => Some(compiled),
                    Err(err) => {
                        error!("{err}");
                        None
                    }
                },
                Err(err) => {
                    error!("{err}");
                    None
                }
            };
        }
        let uniforms = program.as_ref().map(|program| program.uniforms().block());

        let mut wake_lock = options.wake_lock;
        if let Some(lock) = wake_lock.as_mut() {
            if let Err(err) = lock.acquire() {
                debug!(error = %err, "wake lock unavailable");
            }
        }

        info!(
            width = viewport.width,
            height = viewport.height,
            rendering = program.is_some(),
            "pattern view mounted"
        );

        let mut view = Self {
            host,
            surface,
            program,
            uniforms,
            sources,
            viewport,
            input: InputTracker::new(),
            damping: options.damping,
            frame_loop: FrameLoop::new(),
            listeners,
            wake_lock,
            visible: true,
        };
        if view.program.is_some() && !viewport.is_empty() {
            view.host.request_tick();
        }
        view
    }

    pub fn resize(&mut self, size: ViewportSize) {
        if !self.listeners.is_registered(Listener::Resize) {
            return;
        }
        let was_empty = self.viewport.is_empty();
        match self.surface.as_mut() {
            Some(surface) => {
                if surface.resize(size) {
                    self.viewport = surface.size();
                }
            }
            None if !size.is_empty() => self.viewport = size,
            None => {}
        }
        // Ticks pause while there is nothing to draw into.
        if was_empty && !self.viewport.is_empty() && self.program.is_some() {
            self.host.request_tick();
        }
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if !self.listeners.is_registered(Listener::PointerMove) {
            return;
        }
        self.input.pointer_moved(x, y, self.viewport);
    }

    pub fn visibility_changed(&mut self, visible: bool) {
        if !self.listeners.is_registered(Listener::Visibility) || visible == self.visible {
            return;
        }
        self.visible = visible;
        let Some(lock) = self.wake_lock.as_mut() else {
            return;
        };
        if visible {
            if let Err(err) = lock.acquire() {
                debug!(error = %err, "wake lock unavailable");
            }
        } else {
            lock.release();
        }
    }

    /// Uploads this frame's uniforms, draws the quad and schedules the next tick.
    pub fn tick(&mut self, timestamp_ms: f64) -> TickOutcome {
        if !self.frame_loop.is_running() {
            return TickOutcome::Stopped;
        }
        let (Some(surface), Some(block)) = (self.surface.as_mut(), self.uniforms.as_mut()) else {
            return TickOutcome::Blank;
        };
        if self.viewport.is_empty() {
            return TickOutcome::Blank;
        }

        let time = seconds_from_timestamp(timestamp_ms);
        block.set_vec2(RESOLUTION, self.viewport.as_uniform());
        block.set_f32(TIME, time);
        block.set_vec2(OFFSET, self.input.offset().damped(self.damping));

        let backend = surface.backend_mut();
        backend.upload_uniforms(block.as_bytes());
        let outcome = match backend.draw(QUAD_VERTEX_COUNT) {
            Ok(()) => {
                self.frame_loop.record_frame(time);
                TickOutcome::Rendered
            }
            Err(FrameError::SurfaceLost) => {
                debug!("surface lost; reconfiguring");
                surface.reconfigure();
                TickOutcome::Skipped(FrameError::SurfaceLost)
            }
            Err(FrameError::Timeout) => {
                debug!("frame acquisition timed out");
                TickOutcome::Skipped(FrameError::Timeout)
            }
            Err(FrameError::OutOfMemory) => {
                error!("graphics device out of memory; stopping");
                TickOutcome::Skipped(FrameError::OutOfMemory)
            }
        };

        if outcome == TickOutcome::Skipped(FrameError::OutOfMemory) {
            self.teardown();
            return TickOutcome::Stopped;
        }
        if self.frame_loop.is_running() {
            self.host.request_tick();
        }
        outcome
    }

    /// Stops the tick chain and releases everything the mount acquired.
    /// Later calls do nothing.
    pub fn teardown(&mut self) {
        if !self.frame_loop.stop() {
            return;
        }
        self.listeners.clear();
        self.host.exit_presentation();
        if let Some(lock) = self.wake_lock.as_mut() {
            lock.release();
        }
        self.uniforms = None;
        self.program = None;
        self.surface = None;
        info!(frames = self.frame_loop.frame_count(), "pattern view torn down");
    }

    pub fn state(&self) -> LoopState {
        self.frame_loop.state()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn offset(&self) -> Offset {
        self.input.offset()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn program(&self) -> Option<&ShaderProgram> {
        self.program.as_ref()
    }

    pub fn sources(&self) -> &Arc<ShaderSources> {
        &self.sources
    }

    pub fn surface(&self) -> Option<&SurfaceManager<B>> {
        self.surface.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn wake_lock_held(&mut self) -> bool {
        self.wake_lock.as_mut().is_some_and(|lock| lock.is_held())
    }
}

impl<B: RenderBackend, H: PresentationHost> Drop for PatternView<B, H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
