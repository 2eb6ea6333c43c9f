//! One capture subprocess generation.
//!
//! Each spawned ffmpeg instance carries a generation id. Its stdout is
//! drained on a dedicated thread into the event channel as raw chunks
//! tagged with that generation, so the event loop can discard output
//! from a process that is being replaced; its stderr is drained into the
//! log (diagnostic chatter there is not an error).

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::Sender;

use super::config::CaptureConfig;
use super::CaptureError;

/// Read size for the stdout pipe. Large enough to keep syscall overhead
/// low at 1080p frame sizes, small enough for low latency.
const CHUNK_SIZE: usize = 64 * 1024;

/// Events emitted by a capture subprocess reader.
#[derive(Debug)]
pub enum CaptureEvent {
    /// A chunk of raw pixel bytes from the subprocess stdout.
    Data { generation: u64, bytes: Vec<u8> },
    /// The subprocess stdout reached end of stream.
    Eof { generation: u64 },
}

/// A running capture subprocess bound to one generation id.
#[derive(Debug)]
pub struct CaptureProcess {
    child: Child,
    generation: u64,
    stdout_thread: Option<JoinHandle<()>>,
    stderr_thread: Option<JoinHandle<()>>,
}

impl CaptureProcess {
    /// Spawn the capture tool with the given configuration.
    ///
    /// Stdout chunks and the final EOF are delivered to `events`, tagged
    /// with `generation`.
    pub fn spawn(
        ffmpeg_path: &str,
        config: &CaptureConfig,
        generation: u64,
        events: Sender<CaptureEvent>,
    ) -> Result<Self, CaptureError> {
        let args = config.ffmpeg_args();
        log::info!(
            "spawning capture generation {}: {} {}",
            generation,
            ffmpeg_path,
            args.join(" ")
        );

        let mut child = Command::new(ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::ToolNotFound {
                        path: ffmpeg_path.to_string(),
                    }
                } else {
                    CaptureError::SpawnFailed(e)
                }
            })?;

        let stdout_thread = child.stdout.take().map(|mut stdout| {
            let tx = events;
            thread::spawn(move || {
                let mut buf = vec![0u8; CHUNK_SIZE];
                loop {
                    match stdout.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            let event = CaptureEvent::Data {
                                generation,
                                bytes: buf[..n].to_vec(),
                            };
                            if tx.blocking_send(event).is_err() {
                                // Receiver gone: the pipeline is shutting down.
                                return;
                            }
                        }
                        Err(_) => break,
                    }
                }
                let _ = tx.blocking_send(CaptureEvent::Eof { generation });
            })
        });

        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                for line in reader.lines() {
                    match line {
                        // Transient diagnostics: logged, otherwise ignored.
                        Ok(l) => log::debug!("[capture:{}] {}", generation, l),
                        Err(_) => break,
                    }
                }
            })
        });

        Ok(Self {
            child,
            generation,
            stdout_thread,
            stderr_thread,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// The exit code, if the process has already terminated.
    pub fn exit_code(&mut self) -> Option<i32> {
        match self.child.try_wait() {
            Ok(Some(status)) => status.code(),
            _ => None,
        }
    }

    /// Terminate the subprocess: SIGINT, a bounded grace period, then
    /// SIGKILL. Reader threads exit on their own once the pipes close.
    pub fn shutdown(&mut self, grace: Duration) {
        #[cfg(unix)]
        {
            let pid = self.child.id() as i32;
            unsafe {
                libc::kill(pid, libc::SIGINT);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.kill();
        }

        let start = Instant::now();
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if start.elapsed() > grace {
                        let _ = self.child.kill();
                        let _ = self.child.wait();
                        break;
                    }
                    thread::sleep(Duration::from_millis(25));
                }
                Err(_) => break,
            }
        }

        if let Some(h) = self.stdout_thread.take() {
            let _ = h.join();
        }
        if let Some(h) = self.stderr_thread.take() {
            let _ = h.join();
        }
    }
}

impl Drop for CaptureProcess {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown(Duration::from_millis(500));
        }
    }
}
