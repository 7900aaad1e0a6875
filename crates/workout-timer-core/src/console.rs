//! Plain-text rendering of a running session.
//!
//! Each phase occupies one terminal line which is rewritten in place every
//! second (`\r`). A new phase starts a new line; completion is printed on a
//! line of its own.

use std::io::{self, Write};

use crate::events::Event;
use crate::protocol::{format_seconds, Phase, PhaseKind, SessionPlan};
use crate::timer::SessionSummary;

pub const COMPLETION_MESSAGE: &str = "Timer completed!";

/// Single linear countdown with an optional label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleCountdown {
    pub seconds: u64,
    pub label: Option<String>,
}

impl ConsoleCountdown {
    pub fn new(seconds: u64, label: Option<String>) -> Self {
        Self { seconds, label }
    }

    /// One synthetic `other` phase covering the whole countdown.
    pub fn plan(&self) -> SessionPlan {
        SessionPlan {
            protocol: "countdown".to_string(),
            phases: vec![Phase::new(
                self.label.clone().unwrap_or_default(),
                self.seconds,
                PhaseKind::Other,
            )],
            rounds: 0,
        }
    }
}

/// `label: mm:ss`, or just `mm:ss` for an unlabeled phase.
pub fn tick_line(label: &str, remaining_secs: u64) -> String {
    let time = format_seconds(remaining_secs, false);
    if label.is_empty() {
        time
    } else {
        format!("{label}: {time}")
    }
}

/// Writes session events as overwriting countdown lines.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    label: String,
    line_open: bool,
    /// Width of the last line written, so a shorter line can blank it out.
    last_width: usize,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            label: String::new(),
            line_open: false,
            last_width: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, event: &Event) -> io::Result<()> {
        match event {
            Event::PhaseEntered { phase, .. } => {
                self.end_line()?;
                self.label = phase.label.clone();
                self.rewrite(&tick_line(&phase.label, phase.duration))?;
            }
            Event::Tick { remaining_secs, .. } => {
                let line = tick_line(&self.label, *remaining_secs);
                self.rewrite(&line)?;
            }
            Event::Paused { .. } => self.message("Paused")?,
            Event::Resumed { .. } => {}
            Event::Stopped { .. } => self.message("Stopped")?,
            Event::Reset { .. } => self.end_line()?,
            Event::Finished { .. } => self.complete()?,
            Event::StateSnapshot { .. } => {}
        }
        self.out.flush()
    }

    /// Print the completion message on its own line.
    pub fn complete(&mut self) -> io::Result<()> {
        self.message(COMPLETION_MESSAGE)
    }

    fn message(&mut self, text: &str) -> io::Result<()> {
        self.end_line()?;
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    fn rewrite(&mut self, line: &str) -> io::Result<()> {
        let width = line.chars().count();
        let pad = self.last_width.saturating_sub(width);
        write!(self.out, "\r{line}{}", " ".repeat(pad))?;
        self.last_width = width;
        self.line_open = true;
        Ok(())
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
            self.last_width = 0;
        }
        Ok(())
    }
}

/// Human-readable end-of-session report.
pub fn summary_lines(summary: &SessionSummary) -> Vec<String> {
    vec![
        format!("Total work        {}", format_seconds(summary.work(), true)),
        format!("Total recovery    {}", format_seconds(summary.recovery(), true)),
        format!("Rounds completed  {}", summary.rounds),
        format!("Session length    {}", format_seconds(summary.total, true)),
    ]
}
