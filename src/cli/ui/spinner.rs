use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use crate::backend::{Pacer, ThreadPacer};

const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const TICK: Duration = Duration::from_millis(100);

/// Pacer for the interactive shell: waits out the simulated delay while
/// drawing a processing indicator on the current line.
pub struct SpinnerPacer {
    inner: ThreadPacer,
}

impl SpinnerPacer {
    pub fn new(scale: f64) -> Self {
        Self {
            inner: ThreadPacer::new(scale),
        }
    }

    fn draw(out: &mut impl Write, frame: &str, label: &str) -> io::Result<()> {
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(format!("{frame} {label}..."))
        )?;
        out.flush()
    }

    fn clear(out: &mut impl Write) -> io::Result<()> {
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        out.flush()
    }
}

impl Pacer for SpinnerPacer {
    fn pause(&self, label: &str, duration: Duration) {
        let total = self.inner.scaled(duration);
        if total.is_zero() {
            return;
        }
        let mut out = io::stdout();
        let started = Instant::now();
        let mut frame = 0;
        while started.elapsed() < total {
            if Self::draw(&mut out, FRAMES[frame % FRAMES.len()], label).is_err() {
                thread::sleep(total.saturating_sub(started.elapsed()));
                break;
            }
            frame += 1;
            thread::sleep(TICK.min(total.saturating_sub(started.elapsed())));
        }
        let _ = Self::clear(&mut out);
    }
}
