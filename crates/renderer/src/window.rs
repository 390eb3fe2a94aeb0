use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::frame::{time_source_for, LoopState};
use crate::gpu::GpuBackend;
use crate::pipeline::ShaderSources;
use crate::types::{PresentationOptions, RendererConfig, ViewportSize};
use crate::view::{PatternView, PresentationHost, ViewError, ViewOptions};
use crate::wake;

/// [`PresentationHost`] backed by a winit window.
pub struct WindowHost {
    window: Arc<Window>,
    options: PresentationOptions,
}

impl WindowHost {
    pub fn new(window: Arc<Window>, options: PresentationOptions) -> Self {
        Self { window, options }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl PresentationHost for WindowHost {
    fn viewport(&self) -> ViewportSize {
        self.window.inner_size().into()
    }

    fn enter_presentation(&mut self) {
        if self.options.hide_cursor {
            self.window.set_cursor_visible(false);
        }
        if self.options.fullscreen {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }

    fn exit_presentation(&mut self) {
        if self.options.hide_cursor {
            self.window.set_cursor_visible(true);
        }
        if self.options.fullscreen {
            self.window.set_fullscreen(None);
        }
    }

    fn request_tick(&mut self) {
        self.window.request_redraw();
    }
}

/// Opens the window, mounts the view and drives it until close or Escape.
pub(crate) fn run(config: &RendererConfig, sources: Arc<ShaderSources>) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title("psyche")
        .with_inner_size(PhysicalSize::new(config.surface_size.0, config.surface_size.1))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);
    let window_id = window.id();

    let backend = GpuBackend::new(
        window.clone(),
        window.inner_size().into(),
        config.opacity,
        config.overlay.as_ref(),
    )
    .map_err(ViewError::ContextUnavailable);
    let wake_lock = if config.wake_lock {
        wake::platform_default()
    } else {
        None
    };

    let host = WindowHost::new(window, config.presentation);
    let mut view = PatternView::mount(
        host,
        backend,
        sources,
        ViewOptions {
            damping: config.damping,
            wake_lock,
        },
    );
    let mut clock = time_source_for(config.still_time);
    clock.reset();

    let run_result = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        match event {
            Event::WindowEvent { window_id: id, event } if id == window_id => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    view.teardown();
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed
                        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
                    {
                        info!("escape pressed; closing");
                        view.teardown();
                        elwt.exit();
                    }
                }
                WindowEvent::Resized(size) => {
                    view.resize(size.into());
                }
                WindowEvent::CursorMoved { position, .. } => {
                    view.pointer_moved(position.x, position.y);
                }
                WindowEvent::Occluded(occluded) => {
                    debug!(occluded, "visibility changed");
                    view.visibility_changed(!occluded);
                    if !occluded && view.program().is_some() {
                        view.host_mut().request_tick();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let outcome = view.tick(clock.timestamp_ms());
                    tracing::trace!(?outcome, "tick");
                    if view.state() == LoopState::Stopped {
                        elwt.exit();
                    }
                }
                _ => {}
            },
            Event::LoopExiting => {
                view.teardown();
            }
            _ => {}
        }
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
