//! Background-thread spinner shown around blocking generation calls.
//!
//! Contract with the pipeline: start before a Generate call, stop after it
//! returns, regardless of outcome.

use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_DURATION: Duration = Duration::from_millis(80);

pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start animating `message` on stderr. Quiet on non-terminal stderr so
    /// redirected output stays clean.
    pub fn start(message: &str) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        if !std::io::stderr().is_terminal() {
            return Self {
                running,
                handle: None,
            };
        }

        let flag = running.clone();
        let message = message.to_string();
        let handle = std::thread::spawn(move || {
            let mut frame = 0usize;
            let mut err = std::io::stderr();
            while flag.load(Ordering::Relaxed) {
                let _ = write!(err, "\r{} {}", FRAMES[frame % FRAMES.len()], message);
                let _ = err.flush();
                frame += 1;
                std::thread::sleep(FRAME_DURATION);
            }
            // Clear the spinner line before handing the terminal back.
            let _ = write!(err, "\r\x1b[K");
            let _ = err.flush();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.finish();
    }
}
