//! Capture lifecycle control: resolution tiers, debounced restarts,
//! generation tracking.
//!
//! Zoom changes arrive in bursts (a held key repeats), and every tier
//! change means killing and respawning the subprocess, so restart
//! requests are coalesced: each request resets a quiet-period deadline
//! and only the last requested zoom value is acted on. Frames from the
//! outgoing process keep rendering until the swap completes; its output
//! can never reach the new frame buffer because every capture event
//! carries the generation id of the process that produced it.

use std::time::{Duration, Instant};

use tokio::sync::mpsc::Sender;

use super::config::CaptureConfig;
use super::process::{CaptureEvent, CaptureProcess};
use super::tiers::ZoomTiers;
use super::CaptureError;

/// Lifecycle state of the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No subprocess yet.
    Idle,
    /// Subprocess alive and streaming.
    Running,
    /// Old subprocess being replaced; a restart has been committed.
    Restarting,
    /// Subprocess gone: planned shutdown or unexpected exit.
    Stopped,
}

#[derive(Debug, Clone, Copy)]
struct PendingRestart {
    zoom: f32,
    tier: usize,
    deadline: Instant,
}

/// Owns the capture subprocess and decides when to restart it.
pub struct CaptureController {
    ffmpeg_path: String,
    base: CaptureConfig,
    tiers: ZoomTiers,
    debounce: Duration,
    grace: Duration,
    events: Sender<CaptureEvent>,

    state: CaptureState,
    generation: u64,
    active_tier: usize,
    active_config: CaptureConfig,
    pending: Option<PendingRestart>,
    process: Option<CaptureProcess>,
}

impl CaptureController {
    /// Create a controller in the `Idle` state.
    ///
    /// `base` supplies device, frame rates, pixel format, and mirror;
    /// its resolution is replaced by the tier matching the initial zoom.
    pub fn new(
        ffmpeg_path: String,
        base: CaptureConfig,
        tiers: ZoomTiers,
        debounce: Duration,
        grace: Duration,
        events: Sender<CaptureEvent>,
    ) -> Self {
        let active_tier = tiers.select(1.0);
        let (w, h) = tiers.resolution(active_tier);
        let active_config = base.with_resolution(w, h);
        Self {
            ffmpeg_path,
            base,
            tiers,
            debounce,
            grace,
            events,
            state: CaptureState::Idle,
            generation: 0,
            active_tier,
            active_config,
            pending: None,
            process: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Generation id of the most recently spawned subprocess. Events
    /// tagged with any other generation are stale and must be dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_config(&self) -> &CaptureConfig {
        &self.active_config
    }

    /// Spawn the first subprocess at the tier for the initial zoom.
    pub fn start(&mut self, zoom: f32) -> Result<(), CaptureError> {
        self.active_tier = self.tiers.select(zoom);
        let (w, h) = self.tiers.resolution(self.active_tier);
        self.active_config = self.base.with_resolution(w, h);
        self.respawn()?;
        Ok(())
    }

    /// Record a zoom change. Schedules (or reschedules) a debounced
    /// restart if the zoom's tier differs from the active one; cancels
    /// any pending restart if the zoom returned to the active tier.
    pub fn request_zoom(&mut self, zoom: f32, now: Instant) {
        let tier = self.tiers.select(zoom);
        if tier == self.active_tier {
            if self.pending.take().is_some() {
                log::debug!("zoom {:.2} back on active tier, restart cancelled", zoom);
            }
            return;
        }
        self.pending = Some(PendingRestart {
            zoom,
            tier,
            deadline: now + self.debounce,
        });
        log::debug!(
            "zoom {:.2} wants tier {}, restart scheduled in {:?}",
            zoom,
            tier,
            self.debounce
        );
    }

    /// Deadline of the pending restart, if one is scheduled.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// If the debounce window has elapsed, commit the pending tier change
    /// and return the new configuration. The caller resizes its frame
    /// assembler for the returned config and then calls [`respawn`].
    ///
    /// [`respawn`]: CaptureController::respawn
    pub fn take_due_restart(&mut self, now: Instant) -> Option<CaptureConfig> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;
        self.active_tier = pending.tier;
        let (w, h) = self.tiers.resolution(pending.tier);
        self.active_config = self.base.with_resolution(w, h);
        self.state = CaptureState::Restarting;
        log::info!(
            "restarting capture for zoom {:.2}: tier {} ({}x{})",
            pending.zoom,
            pending.tier,
            w,
            h
        );
        Some(self.active_config.clone())
    }

    /// Replace the subprocess with one running the active configuration.
    ///
    /// The old process is detached and terminated first; the new one gets
    /// the next generation id, so any bytes the old process still emits
    /// are discarded by the generation check upstream.
    pub fn respawn(&mut self) -> Result<(), CaptureError> {
        if let Some(mut old) = self.process.take() {
            old.shutdown(self.grace);
        }
        self.generation += 1;
        let process = CaptureProcess::spawn(
            &self.ffmpeg_path,
            &self.active_config,
            self.generation,
            self.events.clone(),
        )?;
        self.process = Some(process);
        self.state = CaptureState::Running;
        Ok(())
    }

    /// Handle an EOF event from a subprocess reader.
    ///
    /// Stale generations (a process that was replaced on purpose) are
    /// ignored. EOF from the current generation while `Running` means the
    /// subprocess died unexpectedly: the controller stops and reports,
    /// it does not retry.
    pub fn handle_eof(&mut self, generation: u64) -> Option<CaptureError> {
        if generation != self.generation {
            log::debug!("ignoring EOF from stale generation {}", generation);
            return None;
        }
        if self.state != CaptureState::Running {
            return None;
        }
        let code = self.process.as_mut().and_then(|p| p.exit_code());
        self.state = CaptureState::Stopped;
        log::error!("capture process exited unexpectedly (code {:?})", code);
        Some(CaptureError::ProcessExited { code })
    }

    /// Stop everything: cancel any pending restart, terminate the
    /// subprocess. Best-effort, safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.pending = None;
        if let Some(mut process) = self.process.take() {
            process.shutdown(self.grace);
        }
        self.state = CaptureState::Stopped;
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn controller(debounce_ms: u64) -> CaptureController {
        let (tx, _rx) = mpsc::channel(8);
        CaptureController::new(
            "ffmpeg".to_string(),
            CaptureConfig::default(),
            ZoomTiers::default(),
            Duration::from_millis(debounce_ms),
            Duration::from_millis(100),
            tx,
        )
    }

    #[test]
    fn test_initial_state_idle() {
        let ctl = controller(500);
        assert_eq!(ctl.state(), CaptureState::Idle);
        assert_eq!(ctl.generation(), 0);
        assert_eq!(ctl.active_config().width, 640);
    }

    #[test]
    fn test_same_tier_zoom_schedules_nothing() {
        let mut ctl = controller(500);
        let now = Instant::now();
        ctl.request_zoom(1.5, now); // still tier 0
        assert!(ctl.pending_deadline().is_none());
        assert!(ctl.take_due_restart(now + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_tier_change_schedules_debounced_restart() {
        let mut ctl = controller(500);
        let now = Instant::now();
        ctl.request_zoom(2.5, now);
        assert_eq!(ctl.pending_deadline(), Some(now + Duration::from_millis(500)));
        // Not due yet.
        assert!(ctl.take_due_restart(now + Duration::from_millis(499)).is_none());
        // Due.
        let cfg = ctl.take_due_restart(now + Duration::from_millis(500)).unwrap();
        assert_eq!((cfg.width, cfg.height), (960, 540));
        assert_eq!(ctl.state(), CaptureState::Restarting);
    }

    #[test]
    fn test_burst_of_requests_coalesces_to_one_restart() {
        // Three rapid +0.5 steps from zoom 1.0: one restart, to the tier
        // for the final zoom 2.5, not an intermediate one.
        let mut ctl = controller(500);
        let start = Instant::now();
        ctl.request_zoom(1.5, start);
        ctl.request_zoom(2.0, start + Duration::from_millis(50));
        ctl.request_zoom(2.5, start + Duration::from_millis(100));

        // Each request pushed the deadline out.
        assert_eq!(
            ctl.pending_deadline(),
            Some(start + Duration::from_millis(600))
        );

        let mut restarts = Vec::new();
        for ms in (0..2000).step_by(50) {
            if let Some(cfg) = ctl.take_due_restart(start + Duration::from_millis(ms)) {
                restarts.push(cfg);
            }
        }
        assert_eq!(restarts.len(), 1);
        assert_eq!((restarts[0].width, restarts[0].height), (960, 540));
    }

    #[test]
    fn test_zoom_returning_to_active_tier_cancels_restart() {
        let mut ctl = controller(500);
        let now = Instant::now();
        ctl.request_zoom(3.5, now);
        assert!(ctl.pending_deadline().is_some());
        ctl.request_zoom(1.0, now + Duration::from_millis(100));
        assert!(ctl.pending_deadline().is_none());
        assert!(ctl.take_due_restart(now + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_last_request_wins() {
        let mut ctl = controller(500);
        let now = Instant::now();
        ctl.request_zoom(2.5, now); // tier 1
        ctl.request_zoom(7.0, now + Duration::from_millis(10)); // tier 3
        let cfg = ctl.take_due_restart(now + Duration::from_secs(1)).unwrap();
        assert_eq!((cfg.width, cfg.height), (1920, 1080));
    }

    #[test]
    fn test_stale_generation_eof_ignored() {
        let mut ctl = controller(500);
        // No process running; an EOF from generation 0 while Idle is not
        // an unexpected exit.
        assert!(ctl.handle_eof(0).is_none());
        assert!(ctl.handle_eof(99).is_none());
        assert_eq!(ctl.state(), CaptureState::Idle);
    }

    #[test]
    fn test_shutdown_cancels_pending() {
        let mut ctl = controller(500);
        ctl.request_zoom(5.0, Instant::now());
        ctl.shutdown();
        assert!(ctl.pending_deadline().is_none());
        assert_eq!(ctl.state(), CaptureState::Stopped);
    }
}
