use crate::monitor::constants::*;
use crate::monitor::delay::DelayController;
use crate::monitor::error::Result;
use crate::monitor::stats::{StatsBoard, TargetStats};
use colored::*;
use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};
use crossterm::Command;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// How frames are written to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayStyle {
    /// Redraw in place with cursor control instead of appending
    pub interactive: bool,
    /// Colour rows green/red by their last outcome
    pub color: bool,
}

impl DisplayStyle {
    /// Interactive, coloured output when stdout is a terminal
    pub fn detect() -> Self {
        let tty = io::stdout().is_terminal();
        Self {
            interactive: tty,
            color: tty,
        }
    }

    /// Append-only output without any escape codes
    pub fn plain() -> Self {
        Self {
            interactive: false,
            color: false,
        }
    }
}

/// Renders one complete frame of the statistics table.
///
/// Columns are padded before colour is applied, so escape codes never shift
/// alignment. Interactive frames start by clearing the screen (`initial`) or
/// homing the cursor, and end lines with `\r\n` because the keyboard
/// listener may hold the terminal in raw mode.
pub fn render_frame(
    stats: &[TargetStats],
    delay_secs: f64,
    style: DisplayStyle,
    initial: bool,
) -> String {
    let newline = if style.interactive { "\r\n" } else { "\n" };
    let indent = " ".repeat(TABLE_INDENT);
    let mut frame = String::new();

    if style.interactive {
        // Writing into a String cannot fail
        if initial {
            let _ = Clear(ClearType::All).write_ansi(&mut frame);
        }
        let _ = MoveTo(0, 0).write_ansi(&mut frame);
    }

    let header = format!(
        "{indent}{:<aw$}{:<sw$}{:<pw$}{:<lw$}",
        "Address",
        "Sent/Recv",
        "Success %",
        "Latency (ms)",
        aw = ADDRESS_COLUMN_WIDTH,
        sw = SENT_RECV_COLUMN_WIDTH,
        pw = SUCCESS_COLUMN_WIDTH,
        lw = LATENCY_COLUMN_WIDTH,
    );
    let rule = format!("{indent}{}", "-".repeat(header.len() - indent.len()));

    let lines = [
        format!("{indent}Press 'Esc' to exit monitoring. Use '+'/'-' to adjust delay."),
        format!("{indent}Current delay: {:.2}s", delay_secs),
        String::new(),
        header,
        rule,
    ];
    for line in lines {
        frame.push_str(&line);
        frame.push_str(newline);
    }

    for stat in stats {
        frame.push_str(&render_row(stat, &indent, style.color));
        frame.push_str(newline);
    }

    frame
}

fn render_row(stat: &TargetStats, indent: &str, color: bool) -> String {
    let sent_recv = format!("{}/{}", stat.sent, stat.received);
    let success = format!("{}%", stat.success_rate().round() as u64);
    let latency = match stat.latency_ms {
        Some(ms) => format!("{:.1}", ms),
        None => "N/A".to_string(),
    };

    let row = format!(
        "{indent}{:<aw$}{:<sw$}{:<pw$}{:<lw$}",
        stat.address,
        sent_recv,
        success,
        latency,
        aw = ADDRESS_COLUMN_WIDTH,
        sw = SENT_RECV_COLUMN_WIDTH,
        pw = SUCCESS_COLUMN_WIDTH,
        lw = LATENCY_COLUMN_WIDTH,
    );

    if !color || stat.sent == 0 {
        return row;
    }
    if stat.last_success {
        row.green().to_string()
    } else {
        row.red().to_string()
    }
}

/// Live table writer shared by every worker and the orchestrator.
///
/// The sink mutex serializes refreshes. It is held only while a frame is
/// rendered and written, never across an await.
pub struct Display {
    board: StatsBoard,
    delay: Arc<DelayController>,
    style: DisplayStyle,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Display {
    pub fn new(
        board: StatsBoard,
        delay: Arc<DelayController>,
        style: DisplayStyle,
        sink: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            board,
            delay,
            style,
            sink: Mutex::new(sink),
        }
    }

    /// Display writing to stdout with the detected style
    pub fn stdout(board: StatsBoard, delay: Arc<DelayController>) -> Self {
        Self::new(board, delay, DisplayStyle::detect(), Box::new(io::stdout()))
    }

    pub fn style(&self) -> DisplayStyle {
        self.style
    }

    /// Render the current statistics and write them as one frame
    pub fn refresh(&self, initial: bool) -> Result<()> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let frame = render_frame(&self.board.snapshot(), self.delay.current(), self.style, initial);
        sink.write_all(frame.as_bytes())?;
        sink.flush()?;
        debug!(bytes = frame.len(), initial = initial, "Frame written");
        Ok(())
    }
}
