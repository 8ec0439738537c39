use crate::{
    config::Config,
    state::UserState,
    timings::{Prayer, PrayerTimings, Timings},
};
use anyhow::Context;
use chrono::Local;
use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor,
    },
    terminal::{
        self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use log::{info, trace};
use std::{
    io::{self, Write},
    mem,
    time::{Duration, Instant},
};

/// Left edge of the card
const CARD_X: u16 = 4;
/// Width of the card, in cells
const CARD_WIDTH: u16 = 34;
const TITLE_Y: u16 = 1;
/// Date row; the city row and separator sit just below
const HEADER_Y: u16 = 3;
/// First prayer row
const LIST_Y: u16 = 7;
/// Blank line between prayer rows, which doubles as the slide-in runway
const ROW_SPACING: u16 = 2;
const FOOTER_Y: u16 = LIST_Y + REVEALS.len() as u16 * ROW_SPACING + 1;
/// Height of the before-first-load placeholder frame
const PLACEHOLDER_HEIGHT: u16 = 9;

/// Loading indicator frames, advanced by wall-clock time
const SPINNER: [&str; 10] =
    ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

/// Entrance schedule for the prayer rows, indexed by display position. Each
/// row waits out its delay, then slides up into its slot.
const REVEALS: [Reveal; 5] = [
    Reveal::new(0, 500),
    Reveal::new(200, 500),
    Reveal::new(400, 500),
    Reveal::new(600, 500),
    Reveal::new(800, 500),
];

/// How far below its slot a row starts, in rows
const SLIDE_ROWS: f32 = 1.0;

/// Manage screen contents and terminal communication
pub struct Display {
    timings: Timings,

    /// The text currently on the screen
    text_buffer: Vec<TextItem>,
    /// The text to be written to the screen soon™. Empty except during a
    /// tick
    next_text_buffer: Vec<TextItem>,

    /// When the widget came up. Drives the spinner
    started: Instant,
    /// When the displayed timings landed. Drives the reveal animation
    revealed_at: Instant,
    /// Generation of the timings the reveal clock was last reset for
    shown_generation: u64,
}

impl Display {
    pub const INTERVAL: Duration = Duration::from_millis(100);

    pub fn new(config: &Config) -> anyhow::Result<Self> {
        terminal::enable_raw_mode()
            .context("Error enabling raw terminal mode")?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)
            .context("Error entering alternate screen")?;
        info!("Display initialized");

        Ok(Self {
            timings: Timings::new(config),
            text_buffer: Vec::new(),
            next_text_buffer: Vec::new(),
            started: Instant::now(),
            revealed_at: Instant::now(),
            shown_generation: 0,
        })
    }

    pub fn tick(&mut self, state: &UserState) -> anyhow::Result<()> {
        trace!("Running display tick");
        self.timings.ensure(state.city);

        // If a completion is mid-write, keep the old frame for one tick
        let Some(fetch) = self.timings.snapshot() else {
            return Ok(());
        };

        if fetch.generation != self.shown_generation {
            // New timings just landed, run the entrance again
            self.shown_generation = fetch.generation;
            self.revealed_at = Instant::now();
        }

        self.draw_title();
        match &fetch.timings {
            // Nothing has ever loaded
            None => self.draw_empty_placeholder(),
            Some(timings) => {
                self.draw_header(timings, state);
                if fetch.loading {
                    self.draw_loading_row();
                } else {
                    self.draw_prayer_rows(timings);
                }
            }
        }
        self.draw_footer();

        self.flush()
    }

    /// Bold title line with a live clock on the right
    fn draw_title(&mut self) {
        self.add_text(
            "مواقيت الصلاة".into(),
            (CARD_X, TITLE_Y),
            TextStyle::Title,
        );
        // https://docs.rs/chrono/latest/chrono/format/strftime/index.html
        let clock = Local::now().format("%_I:%M %p").to_string();
        let x = CARD_X + CARD_WIDTH - clock.len() as u16;
        self.add_text(clock, (x, TITLE_Y), TextStyle::Plain);
    }

    /// Date and city selector rows, with a rule under them
    fn draw_header(&mut self, timings: &PrayerTimings, state: &UserState) {
        self.add_text(
            format!("التاريخ : {}", timings.date()),
            (CARD_X, HEADER_Y),
            TextStyle::Plain,
        );
        self.add_text(
            format!("المدينه : ◂ {} ▸", state.city.label),
            (CARD_X, HEADER_Y + 1),
            TextStyle::Accent,
        );
        self.add_text(
            "─".repeat(CARD_WIDTH as usize),
            (CARD_X, HEADER_Y + 2),
            TextStyle::Dim,
        );
    }

    /// Framed spinner filling the list area, for before anything has loaded
    fn draw_empty_placeholder(&mut self) {
        let inner = CARD_WIDTH as usize - 2;
        self.add_text(
            format!("╭{}╮", "─".repeat(inner)),
            (CARD_X, LIST_Y),
            TextStyle::Dim,
        );
        for dy in 1..PLACEHOLDER_HEIGHT - 1 {
            self.add_text("│".into(), (CARD_X, LIST_Y + dy), TextStyle::Dim);
            self.add_text(
                "│".into(),
                (CARD_X + CARD_WIDTH - 1, LIST_Y + dy),
                TextStyle::Dim,
            );
        }
        self.add_text(
            format!("╰{}╯", "─".repeat(inner)),
            (CARD_X, LIST_Y + PLACEHOLDER_HEIGHT - 1),
            TextStyle::Dim,
        );
        let spinner = self.spinner();
        self.add_text(
            spinner.into(),
            (CARD_X + CARD_WIDTH / 2, LIST_Y + PLACEHOLDER_HEIGHT / 2),
            TextStyle::Accent,
        );
    }

    /// One-line spinner in place of the list, for refetches
    fn draw_loading_row(&mut self) {
        let spinner = self.spinner();
        self.add_text(
            spinner.into(),
            (CARD_X + CARD_WIDTH / 2, LIST_Y + 4),
            TextStyle::Accent,
        );
    }

    /// The five prayer rows, each on its own reveal schedule
    fn draw_prayer_rows(&mut self, timings: &PrayerTimings) {
        let elapsed = self.revealed_at.elapsed();
        for (i, prayer) in Prayer::ALL.into_iter().enumerate() {
            let Some((offset, sliding)) = REVEALS[i].frame(elapsed) else {
                // Not this row's turn yet
                continue;
            };
            let y = LIST_Y + i as u16 * ROW_SPACING + offset;
            let style =
                if sliding { TextStyle::Dim } else { TextStyle::Accent };
            self.add_text(timings.row(prayer), (CARD_X + 2, y), style);
        }
    }

    fn draw_footer(&mut self) {
        self.add_text(
            "◂/▸: city  q: quit".into(),
            (CARD_X, FOOTER_Y),
            TextStyle::Dim,
        );
    }

    /// Force a full repaint on the next tick. The frame diff can't tell that
    /// a resize scrambled the screen.
    pub fn invalidate(&mut self) {
        self.text_buffer.clear();
    }

    /// Spinner frame for the current instant
    fn spinner(&self) -> &'static str {
        spinner_frame(self.started.elapsed())
    }

    /// Add text to the buffer, to be written on this tick's flush
    fn add_text(&mut self, text: String, (x, y): (u16, u16), style: TextStyle) {
        self.next_text_buffer.push(TextItem { text, x, y, style });
    }

    /// If the text changed since the last frame, rewrite the screen. If
    /// nothing changed, do nothing. Redrawing every tick makes some terminal
    /// emulators flicker.
    fn flush(&mut self) -> anyhow::Result<()> {
        if self.next_text_buffer == self.text_buffer {
            self.next_text_buffer.clear();
            return Ok(());
        }
        trace!(
            "Text changed: old={:?}; new={:?}",
            self.text_buffer,
            self.next_text_buffer
        );
        self.text_buffer = mem::take(&mut self.next_text_buffer);

        let mut stdout = io::stdout();
        queue!(stdout, Clear(ClearType::All))?;
        for item in &self.text_buffer {
            queue!(stdout, MoveTo(item.x, item.y))?;
            match item.style {
                TextStyle::Plain => {}
                TextStyle::Title => {
                    queue!(stdout, SetAttribute(Attribute::Bold))?
                }
                TextStyle::Accent => {
                    queue!(stdout, SetForegroundColor(Color::DarkYellow))?
                }
                TextStyle::Dim => queue!(stdout, SetAttribute(Attribute::Dim))?,
            }
            queue!(
                stdout,
                Print(&item.text),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        }
        stdout.flush().context("Error writing frame to terminal")
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Errors here have nowhere to go, we may already be unwinding
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
        info!("Closing display");
    }
}

/// One positioned run of styled text
#[derive(Debug, PartialEq)]
struct TextItem {
    text: String,
    x: u16,
    y: u16,
    style: TextStyle,
}

/// Proxy for terminal styling, so the frame diff stays a plain compare
#[derive(Copy, Clone, Debug, PartialEq)]
enum TextStyle {
    Plain,
    /// Bold, for the title
    Title,
    /// Amber highlight, for the times and the selector
    Accent,
    /// Faint, for chrome and for rows still sliding in
    Dim,
}

/// Entrance schedule for one row
#[derive(Copy, Clone, Debug)]
struct Reveal {
    delay: Duration,
    duration: Duration,
}

impl Reveal {
    const fn new(delay_ms: u64, duration_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            duration: Duration::from_millis(duration_ms),
        }
    }

    /// Where a row sits at `elapsed` since the animation started: `None`
    /// while the row is still hidden, otherwise its offset below its slot
    /// and whether it's still moving
    fn frame(&self, elapsed: Duration) -> Option<(u16, bool)> {
        if elapsed < self.delay {
            return None;
        }
        let progress = (elapsed - self.delay).as_secs_f32()
            / self.duration.as_secs_f32();
        if progress >= 1.0 {
            return Some((0, false));
        }
        let offset = ((1.0 - ease_out(progress)) * SLIDE_ROWS).round() as u16;
        Some((offset, true))
    }
}

/// Cubic ease-out: fast start, slow settle
fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

fn spinner_frame(elapsed: Duration) -> &'static str {
    let index =
        (elapsed.as_millis() / SPINNER_INTERVAL.as_millis()) as usize;
    SPINNER[index % SPINNER.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_schedule() {
        // Third row: hidden until 400ms in
        assert_eq!(REVEALS[2].frame(Duration::from_millis(300)), None);
        assert_eq!(REVEALS[2].frame(Duration::from_millis(399)), None);
        // Right after its delay it's one row low and still moving
        assert_eq!(
            REVEALS[2].frame(Duration::from_millis(400)),
            Some((1, true))
        );
        // Settled at delay + duration
        assert_eq!(
            REVEALS[2].frame(Duration::from_millis(900)),
            Some((0, false))
        );

        // First row starts immediately, last row settles at 1.3s
        assert_eq!(REVEALS[0].frame(Duration::ZERO), Some((1, true)));
        assert_eq!(
            REVEALS[0].frame(Duration::from_millis(500)),
            Some((0, false))
        );
        assert_eq!(REVEALS[4].frame(Duration::from_millis(799)), None);
        assert_eq!(
            REVEALS[4].frame(Duration::from_millis(1300)),
            Some((0, false))
        );
    }

    #[test]
    fn test_reveal_never_moves_down() {
        let reveal = REVEALS[0];
        let mut last_offset = u16::MAX;
        for ms in (0..=600).step_by(10) {
            if let Some((offset, _)) = reveal.frame(Duration::from_millis(ms))
            {
                assert!(offset <= last_offset, "offset went up at {ms}ms");
                last_offset = offset;
            }
        }
        assert_eq!(last_offset, 0);
    }

    #[test]
    fn test_ease_out() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert_eq!(ease_out(0.5), 0.875);
    }

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(spinner_frame(Duration::ZERO), SPINNER[0]);
        assert_eq!(spinner_frame(Duration::from_millis(80)), SPINNER[1]);
        assert_eq!(spinner_frame(Duration::from_millis(790)), SPINNER[9]);
        assert_eq!(spinner_frame(Duration::from_millis(800)), SPINNER[0]);
    }
}
