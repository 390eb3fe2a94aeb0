mod support;

use std::sync::Arc;

use renderer::uniforms::{decode_f32, decode_vec2, OFFSET, RESOLUTION, TIME};
use renderer::view::Listener;
use renderer::{
    FrameError, LoopState, Offset, PatternView, RenderBackend, RendererConfig, ShaderSources,
    TickOutcome, ViewError, ViewOptions, ViewportSize,
};

use support::{CountingWakeLock, LogCapture, RecordingBackend, RecordingHost, RefusingWakeLock};

type View = PatternView<RecordingBackend, RecordingHost>;

fn bundled_sources() -> Arc<ShaderSources> {
    ShaderSources::load(&RendererConfig::default()).expect("bundled sources")
}

fn mount(backend: RecordingBackend, host: RecordingHost) -> View {
    PatternView::mount(host, Ok(backend), bundled_sources(), ViewOptions::default())
}

fn last_upload(view: &View, backend: &RecordingBackend) -> ([f32; 2], [f32; 2], f32) {
    let table = view.program().expect("linked program").uniforms();
    let log = backend.log.borrow();
    let bytes = log.uploads.last().expect("an upload");
    (
        decode_vec2(bytes, table.slot(RESOLUTION).unwrap()).unwrap(),
        decode_vec2(bytes, table.slot(OFFSET).unwrap()).unwrap(),
        decode_f32(bytes, table.slot(TIME).unwrap()).unwrap(),
    )
}

#[test]
fn mount_prepares_surface_and_schedules_first_tick() {
    let backend = RecordingBackend::new();
    let host = RecordingHost::new(800, 600);
    let host_log = host.log.clone();
    let view = mount(backend.clone(), host);

    assert_eq!(view.state(), LoopState::Running);
    assert!(view.program().is_some());
    assert!(view.listeners().is_registered(Listener::Resize));
    assert!(view.listeners().is_registered(Listener::PointerMove));
    assert!(view.listeners().is_registered(Listener::Visibility));

    let log = backend.log.borrow();
    assert_eq!(log.configured, vec![ViewportSize::new(800, 600)]);
    assert_eq!(log.clears, 1);
    assert_eq!(log.links, 1);
    assert_eq!(host_log.borrow().entered, 1);
    assert_eq!(host_log.borrow().ticks_requested, 1);
}

#[test]
fn resize_keeps_drawable_in_step_with_viewport() {
    let backend = RecordingBackend::new();
    let mut view = mount(backend.clone(), RecordingHost::new(800, 600));

    view.resize(ViewportSize::new(1024, 768));
    let surface = view.surface().expect("surface");
    assert_eq!(surface.size(), ViewportSize::new(1024, 768));
    assert_eq!(
        surface.backend().drawable_size(),
        ViewportSize::new(1024, 768)
    );
    assert_eq!(view.viewport(), ViewportSize::new(1024, 768));

    view.resize(ViewportSize::new(0, 768));
    assert_eq!(view.viewport(), ViewportSize::new(1024, 768));
    assert_eq!(backend.log.borrow().configured.len(), 2);
}

#[test]
fn minimised_mount_waits_for_a_real_viewport() {
    let backend = RecordingBackend::new();
    let host = RecordingHost::new(0, 0);
    let host_log = host.log.clone();
    let mut view = mount(backend.clone(), host);

    assert!(view.program().is_some());
    assert!(backend.log.borrow().configured.is_empty());
    assert_eq!(host_log.borrow().ticks_requested, 0);
    assert_eq!(view.tick(0.0), TickOutcome::Blank);
    assert!(backend.log.borrow().uploads.is_empty());

    view.resize(ViewportSize::new(640, 480));
    assert_eq!(host_log.borrow().ticks_requested, 1);
    assert_eq!(view.tick(16.0), TickOutcome::Rendered);
    let (resolution, _, _) = last_upload(&view, &backend);
    assert_eq!(resolution, [640.0, 480.0]);
}

#[test]
fn pointer_offset_is_recentered_and_damped_at_upload() {
    let backend = RecordingBackend::new();
    let mut view = mount(backend.clone(), RecordingHost::new(800, 600));

    view.pointer_moved(500.0, 200.0);
    assert_eq!(view.offset(), Offset::new(100.0, -100.0));

    assert_eq!(view.tick(0.0), TickOutcome::Rendered);
    let (_, offset, _) = last_upload(&view, &backend);
    assert!((offset[0] - 10.0).abs() < 1e-5);
    assert!((offset[1] + 10.0).abs() < 1e-5);
}

#[test]
fn damping_is_configurable() {
    let backend = RecordingBackend::new();
    let mut view = PatternView::mount(
        RecordingHost::new(1024, 768),
        Ok(backend.clone()),
        bundled_sources(),
        ViewOptions {
            damping: 0.5,
            wake_lock: None,
        },
    );
    view.pointer_moved(724.0, 568.0);
    view.tick(16.0);
    let (_, offset, _) = last_upload(&view, &backend);
    assert_eq!(offset, [106.0, 92.0]);
}

#[test]
fn resize_pointer_and_tick_end_to_end() {
    let backend = RecordingBackend::new();
    let host = RecordingHost::new(800, 600);
    let host_log = host.log.clone();
    let mut view = mount(backend.clone(), host);

    view.resize(ViewportSize::new(1024, 768));
    view.pointer_moved(724.0, 568.0);
    assert_eq!(view.offset(), Offset::new(212.0, 184.0));

    assert_eq!(view.tick(1000.0), TickOutcome::Rendered);

    let (resolution, offset, time) = last_upload(&view, &backend);
    assert_eq!(resolution, [1024.0, 768.0]);
    assert!((offset[0] - 21.2).abs() < 1e-4, "offset {offset:?}");
    assert!((offset[1] - 18.4).abs() < 1e-4, "offset {offset:?}");
    assert_eq!(time, 1.0);
    assert_eq!(backend.log.borrow().draws, vec![6]);
    assert_eq!(host_log.borrow().ticks_requested, 2);
}

#[test]
fn teardown_is_idempotent_and_stops_the_chain() {
    let backend = RecordingBackend::new();
    let host = RecordingHost::new(800, 600);
    let host_log = host.log.clone();
    let mut view = mount(backend.clone(), host);
    view.tick(0.0);

    view.teardown();
    view.teardown();

    assert_eq!(view.state(), LoopState::Stopped);
    assert!(view.listeners().is_empty());
    assert!(view.program().is_none());
    assert!(view.surface().is_none());
    assert_eq!(host_log.borrow().exited, 1);

    let requested = host_log.borrow().ticks_requested;
    assert_eq!(view.tick(16.0), TickOutcome::Stopped);
    assert_eq!(host_log.borrow().ticks_requested, requested);
    assert_eq!(backend.log.borrow().draws.len(), 1);

    view.resize(ViewportSize::new(1920, 1080));
    view.pointer_moved(10.0, 10.0);
    assert_eq!(view.viewport(), ViewportSize::new(800, 600));
    assert_eq!(view.offset(), Offset::default());
}

#[test]
fn dropping_a_view_tears_it_down() {
    let host = RecordingHost::new(640, 480);
    let host_log = host.log.clone();
    let view = mount(RecordingBackend::new(), host);
    drop(view);
    assert_eq!(host_log.borrow().exited, 1);
}

#[test]
fn invalid_fragment_leaves_a_cleared_blank_surface() {
    let backend = RecordingBackend::new();
    let host = RecordingHost::new(800, 600);
    let host_log = host.log.clone();
    let mut view = PatternView::mount(
        host,
        Ok(backend.clone()),
        Arc::new(ShaderSources::with_fragment("#version 450\nvoid main( {\n")),
        ViewOptions::default(),
    );

    assert!(view.program().is_none());
    assert_eq!(view.tick(0.0), TickOutcome::Blank);
    assert_eq!(view.tick(16.0), TickOutcome::Blank);

    let log = backend.log.borrow();
    assert_eq!(log.clears, 1);
    assert_eq!(log.links, 0);
    assert!(log.uploads.is_empty());
    assert!(log.draws.is_empty());
    assert_eq!(host_log.borrow().ticks_requested, 0);
    drop(log);

    view.teardown();
    assert_eq!(host_log.borrow().exited, 1);
}

#[test]
fn invalid_fragment_logs_the_compiler_diagnostic() {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let backend = RecordingBackend::new();
    let view = tracing::subscriber::with_default(subscriber, || {
        PatternView::mount(
            RecordingHost::new(800, 600),
            Ok(backend.clone()),
            Arc::new(ShaderSources::with_fragment("#version 450\nvoid main( {\n")),
            ViewOptions::default(),
        )
    });

    assert!(view.program().is_none());
    assert!(backend.log.borrow().draws.is_empty());
    let logged = capture.contents();
    assert!(logged.contains("ERROR"), "log: {logged}");
    assert!(
        logged.contains("fragment shader failed to compile"),
        "log: {logged}"
    );
}

#[test]
fn link_failure_is_terminal() {
    let backend = RecordingBackend {
        fail_link: true,
        ..RecordingBackend::new()
    };
    let mut view = mount(backend.clone(), RecordingHost::new(800, 600));
    assert!(view.program().is_none());
    assert_eq!(view.tick(0.0), TickOutcome::Blank);
    assert!(backend.log.borrow().draws.is_empty());
}

#[test]
fn unavailable_context_mounts_without_rendering() {
    let host = RecordingHost::new(800, 600);
    let host_log = host.log.clone();
    let mut view: View = PatternView::mount(
        host,
        Err(ViewError::ContextUnavailable(anyhow::anyhow!("no adapter"))),
        bundled_sources(),
        ViewOptions::default(),
    );

    assert!(view.surface().is_none());
    assert!(view.program().is_none());
    view.resize(ViewportSize::new(1024, 768));
    assert_eq!(view.viewport(), ViewportSize::new(1024, 768));
    assert_eq!(view.tick(0.0), TickOutcome::Blank);

    view.teardown();
    assert_eq!(view.state(), LoopState::Stopped);
    assert_eq!(host_log.borrow().exited, 1);
}

#[test]
fn lost_surface_is_reconfigured_at_current_size() {
    let backend = RecordingBackend::new();
    let host = RecordingHost::new(800, 600);
    let host_log = host.log.clone();
    let mut view = mount(backend.clone(), host);

    *backend.next_draw_error.borrow_mut() = Some(FrameError::SurfaceLost);
    assert_eq!(
        view.tick(0.0),
        TickOutcome::Skipped(FrameError::SurfaceLost)
    );
    assert_eq!(
        backend.log.borrow().configured,
        vec![ViewportSize::new(800, 600), ViewportSize::new(800, 600)]
    );
    assert_eq!(view.state(), LoopState::Running);
    assert_eq!(host_log.borrow().ticks_requested, 2);

    assert_eq!(view.tick(16.0), TickOutcome::Rendered);
}

#[test]
fn out_of_memory_tears_the_view_down() {
    let backend = RecordingBackend::new();
    let host = RecordingHost::new(800, 600);
    let host_log = host.log.clone();
    let mut view = mount(backend.clone(), host);

    *backend.next_draw_error.borrow_mut() = Some(FrameError::OutOfMemory);
    assert_eq!(view.tick(0.0), TickOutcome::Stopped);
    assert_eq!(view.state(), LoopState::Stopped);
    assert_eq!(host_log.borrow().exited, 1);
    assert_eq!(host_log.borrow().ticks_requested, 1);
}

#[test]
fn wake_lock_follows_visibility() {
    let lock = CountingWakeLock::default();
    let mut view = PatternView::mount(
        RecordingHost::new(800, 600),
        Ok(RecordingBackend::new()),
        bundled_sources(),
        ViewOptions {
            wake_lock: Some(Box::new(lock.clone())),
            ..ViewOptions::default()
        },
    );
    assert!(view.wake_lock_held());

    view.visibility_changed(false);
    assert!(!view.wake_lock_held());
    view.visibility_changed(true);
    assert!(view.wake_lock_held());
    assert_eq!(*lock.acquisitions.borrow(), 2);

    view.teardown();
    assert!(!*lock.held.borrow());
}

#[test]
fn refused_wake_lock_is_ignored() {
    let mut view = PatternView::mount(
        RecordingHost::new(800, 600),
        Ok(RecordingBackend::new()),
        bundled_sources(),
        ViewOptions {
            wake_lock: Some(Box::new(RefusingWakeLock)),
            ..ViewOptions::default()
        },
    );
    assert!(!view.wake_lock_held());
    assert_eq!(view.tick(0.0), TickOutcome::Rendered);
}
