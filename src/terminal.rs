//! Terminal setup and panic-safe restoration.
//!
//! The viewer takes over the whole screen: raw mode, alternate screen,
//! hidden cursor. All three must be undone on every exit path, including
//! panics, or the user's shell is left unusable.

use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};

/// Static flag to track if the terminal is captured (for panic handler).
pub(crate) static TERMINAL_CAPTURED: AtomicBool = AtomicBool::new(false);

/// Guard that restores the terminal on drop.
/// Handles both normal exits and panics.
pub struct TerminalGuard {
    /// Whether this guard is responsible for cleanup.
    active: bool,
}

impl TerminalGuard {
    /// Enter raw mode, switch to the alternate screen, and hide the
    /// cursor. Returns a guard that undoes all of it on drop.
    pub fn enter() -> io::Result<Self> {
        // Install panic hook before touching terminal state.
        install_panic_hook();

        enable_raw_mode()?;
        if let Err(e) = crossterm::execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        TERMINAL_CAPTURED.store(true, Ordering::SeqCst);

        Ok(Self { active: true })
    }

    /// Manually restore the terminal without dropping the guard.
    /// After calling this, the guard's drop will be a no-op.
    pub fn exit(&mut self) -> io::Result<()> {
        if self.active {
            self.active = false;
            TERMINAL_CAPTURED.store(false, Ordering::SeqCst);
            crossterm::execute!(io::stdout(), Show, LeaveAlternateScreen)?;
            disable_raw_mode()?;
            io::stdout().flush()?;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            TERMINAL_CAPTURED.store(false, Ordering::SeqCst);
            // Best-effort cleanup - ignore errors during drop
            let _ = crossterm::execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message, so the message is actually readable.
pub(crate) fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return; // Already installed
    }

    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if TERMINAL_CAPTURED.load(Ordering::SeqCst) {
            let _ = crossterm::execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
            TERMINAL_CAPTURED.store(false, Ordering::SeqCst);
        }

        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_enter_and_drop() {
        // Raw mode requires a real TTY; skip when there is none (CI).
        match TerminalGuard::enter() {
            Ok(guard) => {
                assert!(TERMINAL_CAPTURED.load(Ordering::SeqCst));
                drop(guard);
                assert!(!TERMINAL_CAPTURED.load(Ordering::SeqCst));
            }
            Err(e) => {
                eprintln!("Skipping test (no TTY): {}", e);
            }
        }
    }

    #[test]
    fn test_guard_manual_exit() {
        match TerminalGuard::enter() {
            Ok(mut guard) => {
                guard.exit().expect("Should restore terminal");
                assert!(!TERMINAL_CAPTURED.load(Ordering::SeqCst));
                // Drop should be a no-op now.
                drop(guard);
                assert!(!TERMINAL_CAPTURED.load(Ordering::SeqCst));
            }
            Err(e) => {
                eprintln!("Skipping test (no TTY): {}", e);
            }
        }
    }

    #[test]
    fn test_panic_hook_installation() {
        install_panic_hook();
        install_panic_hook(); // Second call should be no-op
    }
}
