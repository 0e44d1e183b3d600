//! Non-blocking keyboard control.
//!
//! A background thread reads raw keystrokes and hands the orchestrator two
//! signals: a FIFO of delay adjustments and a one-shot escape latch. Raw
//! mode also swallows the terminal's SIGINT, so Ctrl+C is reported through
//! a third latch and treated as an operator interrupt.

use crate::monitor::constants::INPUT_POLL_INTERVAL_MS;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::collections::VecDeque;
use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// What a single keystroke asks the monitor to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Escape,
    Interrupt,
    /// +1 lengthens the delay by one step, -1 shortens it
    Adjust(i8),
    Ignore,
}

pub fn map_key(key: &KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Esc => KeyAction::Escape,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyAction::Interrupt
        }
        KeyCode::Char('+') => KeyAction::Adjust(1),
        KeyCode::Char('-') | KeyCode::Char('_') => KeyAction::Adjust(-1),
        _ => KeyAction::Ignore,
    }
}

/// Source of live control signals consumed by the orchestrator
pub trait ControlInput: Send + Sync {
    /// Begin listening; a no-op when input is unavailable
    fn start(&self);

    /// End listening and wait for the reader to finish. Idempotent.
    fn stop(&self);

    /// Remove and return the oldest pending adjustment direction
    fn consume_adjustment(&self) -> Option<i8>;

    /// True once escape has been seen; never cleared
    fn pressed(&self) -> bool;

    /// True once an interrupt keystroke has been seen; never cleared
    fn interrupted(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct ListenerShared {
    adjustments: Mutex<VecDeque<i8>>,
    escape: AtomicBool,
    interrupt: AtomicBool,
    stop: AtomicBool,
}

impl ListenerShared {
    fn queue(&self) -> MutexGuard<'_, VecDeque<i8>> {
        self.adjustments.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one action. Returns true when the read loop should end.
    fn handle(&self, action: KeyAction) -> bool {
        match action {
            KeyAction::Escape => {
                debug!("Escape pressed");
                self.escape.store(true, Ordering::SeqCst);
                self.stop.store(true, Ordering::SeqCst);
                true
            }
            KeyAction::Interrupt => {
                debug!("Interrupt keystroke received");
                self.interrupt.store(true, Ordering::SeqCst);
                self.stop.store(true, Ordering::SeqCst);
                true
            }
            KeyAction::Adjust(direction) => {
                self.queue().push_back(direction);
                false
            }
            KeyAction::Ignore => false,
        }
    }
}

/// Restores cooked mode however the read loop exits
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(error = %e, "Failed to restore terminal mode");
        }
    }
}

/// Keyboard listener backed by crossterm on a dedicated thread
#[derive(Debug)]
pub struct KeyboardListener {
    shared: Arc<ListenerShared>,
    supported: bool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Default for KeyboardListener {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardListener {
    /// Listener that is active only when stdin is an interactive terminal
    pub fn new() -> Self {
        Self::with_support(io::stdin().is_terminal())
    }

    /// Listener that never reads the keyboard
    pub fn detached() -> Self {
        Self::with_support(false)
    }

    fn with_support(supported: bool) -> Self {
        Self {
            shared: Arc::new(ListenerShared::default()),
            supported,
            handle: Mutex::new(None),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    fn handle_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_loop(shared: Arc<ListenerShared>) {
    let _guard = match RawModeGuard::enable() {
        Ok(guard) => guard,
        Err(e) => {
            debug!(error = %e, "Raw terminal mode unavailable, keyboard control disabled");
            return;
        }
    };
    let poll_interval = Duration::from_millis(INPUT_POLL_INTERVAL_MS);

    while !shared.stop.load(Ordering::SeqCst) {
        match event::poll(poll_interval) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "Keyboard poll failed, keyboard control disabled");
                break;
            }
        }
        match event::read() {
            Ok(Event::Key(key)) => {
                if shared.handle(map_key(&key)) {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Keyboard read failed, keyboard control disabled");
                break;
            }
        }
    }
    debug!("Keyboard listener finished");
}

impl ControlInput for KeyboardListener {
    fn start(&self) {
        if !self.supported {
            debug!("No interactive terminal, keyboard control disabled");
            return;
        }
        let mut slot = self.handle_slot();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("multiping-input".into())
            .spawn(move || read_loop(shared))
        {
            Ok(handle) => *slot = Some(handle),
            Err(e) => warn!(error = %e, "Failed to start keyboard listener"),
        }
    }

    fn stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        let handle = self.handle_slot().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Keyboard listener thread panicked");
            }
        }
    }

    fn consume_adjustment(&self) -> Option<i8> {
        self.shared.queue().pop_front()
    }

    fn pressed(&self) -> bool {
        self.shared.escape.load(Ordering::SeqCst)
    }

    fn interrupted(&self) -> bool {
        self.shared.interrupt.load(Ordering::SeqCst)
    }
}
