#![allow(dead_code)]

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use renderer::wake::{WakeLock, WakeLockError};
use renderer::{
    FrameError, PipelineError, PresentationHost, RenderBackend, ShaderProgram, ViewportSize,
};

/// Everything a [`RecordingBackend`] was asked to do, in order.
#[derive(Debug, Default)]
pub struct BackendLog {
    pub configured: Vec<ViewportSize>,
    pub clears: usize,
    pub links: usize,
    pub uploads: Vec<Vec<u8>>,
    pub draws: Vec<u32>,
}

#[derive(Clone, Default)]
pub struct RecordingBackend {
    pub log: Rc<RefCell<BackendLog>>,
    pub size: ViewportSize,
    pub fail_link: bool,
    pub next_draw_error: Rc<RefCell<Option<FrameError>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for RecordingBackend {
    fn configure(&mut self, size: ViewportSize) {
        self.size = size;
        self.log.borrow_mut().configured.push(size);
    }

    fn drawable_size(&self) -> ViewportSize {
        self.size
    }

    fn clear(&mut self) -> Result<(), FrameError> {
        self.log.borrow_mut().clears += 1;
        Ok(())
    }

    fn link(&mut self, _program: &ShaderProgram) -> Result<(), PipelineError> {
        if self.fail_link {
            return Err(PipelineError::Link {
                diagnostic: "device rejected pipeline".to_string(),
            });
        }
        self.log.borrow_mut().links += 1;
        Ok(())
    }

    fn upload_uniforms(&mut self, block: &[u8]) {
        self.log.borrow_mut().uploads.push(block.to_vec());
    }

    fn draw(&mut self, vertex_count: u32) -> Result<(), FrameError> {
        if let Some(err) = self.next_draw_error.borrow_mut().take() {
            return Err(err);
        }
        self.log.borrow_mut().draws.push(vertex_count);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HostLog {
    pub entered: usize,
    pub exited: usize,
    pub ticks_requested: usize,
}

pub struct RecordingHost {
    pub viewport: ViewportSize,
    pub log: Rc<RefCell<HostLog>>,
}

impl RecordingHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: ViewportSize::new(width, height),
            log: Rc::default(),
        }
    }
}

impl PresentationHost for RecordingHost {
    fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    fn enter_presentation(&mut self) {
        self.log.borrow_mut().entered += 1;
    }

    fn exit_presentation(&mut self) {
        self.log.borrow_mut().exited += 1;
    }

    fn request_tick(&mut self) {
        self.log.borrow_mut().ticks_requested += 1;
    }
}

/// In-memory wake lock that counts transitions.
#[derive(Clone, Default)]
pub struct CountingWakeLock {
    pub held: Rc<RefCell<bool>>,
    pub acquisitions: Rc<RefCell<usize>>,
}

impl WakeLock for CountingWakeLock {
    fn acquire(&mut self) -> Result<(), WakeLockError> {
        if !*self.held.borrow() {
            *self.held.borrow_mut() = true;
            *self.acquisitions.borrow_mut() += 1;
        }
        Ok(())
    }

    fn release(&mut self) {
        *self.held.borrow_mut() = false;
    }

    fn is_held(&mut self) -> bool {
        *self.held.borrow()
    }
}

/// A wake lock the platform refuses.
pub struct RefusingWakeLock;

impl WakeLock for RefusingWakeLock {
    fn acquire(&mut self) -> Result<(), WakeLockError> {
        Err(WakeLockError::Unsupported)
    }

    fn release(&mut self) {}

    fn is_held(&mut self) -> bool {
        false
    }
}

/// Shared buffer a test subscriber writes formatted events into.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
