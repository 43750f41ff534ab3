//! User feedback: display lines, the RGB indicator and the buzzer
//!
//! [`FeedbackSink`] is the thin output contract. [`Feedback`] sits on top of
//! it and owns the timing of every cue (beeps, failure flashing, message
//! hold) so the rest of the controller only says *what* to show.

use crate::clock::Clock;
use crate::config::ControllerConfig;
use std::time::Duration;
use tracing::trace;

/// One colour of the RGB indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    Red,
    Green,
    Blue,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Indicator::Red, Indicator::Green, Indicator::Blue];

    fn index(self) -> usize {
        match self {
            Indicator::Red => 0,
            Indicator::Green => 1,
            Indicator::Blue => 2,
        }
    }
}

/// Output side of the user interface
pub trait FeedbackSink {
    /// Replace the whole display with `lines`
    fn render_lines(&mut self, lines: &[&str]);

    fn set_indicator(&mut self, indicator: Indicator, on: bool);

    /// Start a tone of `duration`; the caller waits it out
    fn tone(&mut self, duration: Duration);
}

/// Sequenced cues on top of a sink
pub struct Feedback<F, C> {
    sink: F,
    clock: C,
    lit: [bool; 3],
    status_hold: Duration,
    flash_pulses: u32,
    flash_period: Duration,
    cue_tone: Duration,
    completion_settle: Duration,
}

impl<F: FeedbackSink, C: Clock> Feedback<F, C> {
    pub fn new(sink: F, clock: C, config: &ControllerConfig) -> Self {
        let mut feedback = Self {
            sink,
            clock,
            lit: [true; 3],
            status_hold: config.status_hold,
            flash_pulses: config.failure_flash_pulses,
            flash_period: config.failure_flash_period,
            cue_tone: config.cue_tone,
            completion_settle: config.completion_settle,
        };
        // Known starting point for the change tracking
        feedback.lights_off();
        feedback
    }

    pub fn show(&mut self, lines: &[&str]) {
        self.sink.render_lines(lines);
    }

    /// Switch one colour, forwarding only actual changes
    pub fn set(&mut self, indicator: Indicator, on: bool) {
        let slot = &mut self.lit[indicator.index()];
        if *slot != on {
            *slot = on;
            self.sink.set_indicator(indicator, on);
        }
    }

    /// Light exactly `on`, everything else off
    pub fn set_lights(&mut self, on: &[Indicator]) {
        for indicator in Indicator::ALL {
            self.set(indicator, on.contains(&indicator));
        }
    }

    pub fn lights_off(&mut self) {
        self.set_lights(&[]);
    }

    pub fn is_lit(&self, indicator: Indicator) -> bool {
        self.lit[indicator.index()]
    }

    /// Keep the current screen up for the status hold time
    pub fn hold(&mut self) {
        self.clock.sleep(self.status_hold);
    }

    /// Alternate red+blue to signal a mount or unmount failure
    pub fn flash_failure(&mut self) {
        self.lights_off();
        for pulse in 1..=self.flash_pulses {
            let on = pulse % 2 == 1;
            self.set(Indicator::Red, on);
            self.set(Indicator::Blue, on);
            self.clock.sleep(self.flash_period);
        }
    }

    /// Single beep when a capture starts
    pub fn start_cue(&mut self) {
        self.beep();
    }

    /// Double beep when a capture ends normally
    pub fn completion_cue(&mut self) {
        self.beep();
        self.clock.sleep(self.cue_tone);
        self.beep();
        self.clock.sleep(self.completion_settle);
    }

    fn beep(&mut self) {
        trace!("Beep {} ms", self.cue_tone.as_millis());
        self.sink.tone(self.cue_tone);
        self.clock.sleep(self.cue_tone);
    }

    pub fn sink(&self) -> &F {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut F {
        &mut self.sink
    }
}

/// Feedback printed to the terminal
///
/// Draws the display as a framed block and reports indicator and buzzer
/// changes on their own lines. Identical consecutive frames are skipped so
/// the idle loop does not flood the terminal.
#[derive(Debug, Default)]
pub struct ConsoleFeedback {
    last_frame: Vec<String>,
    lit: [bool; 3],
}

impl ConsoleFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    fn lights(&self) -> String {
        let mut out = String::new();
        for (indicator, tag) in Indicator::ALL.iter().zip(["R", "G", "B"]) {
            out.push_str(if self.lit[indicator.index()] { tag } else { "." });
        }
        out
    }
}

impl FeedbackSink for ConsoleFeedback {
    fn render_lines(&mut self, lines: &[&str]) {
        if self.last_frame.iter().map(String::as_str).eq(lines.iter().copied()) {
            return;
        }
        self.last_frame = lines.iter().map(|l| l.to_string()).collect();

        let width = 16;
        println!(
            "+{}+ {} [{}]",
            "-".repeat(width),
            chrono::Local::now().format("%H:%M:%S"),
            self.lights()
        );
        for line in lines {
            println!("|{:<width$}|", line, width = width);
        }
        println!("+{}+", "-".repeat(width));
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        self.lit[indicator.index()] = on;
        println!("  LED [{}]", self.lights());
    }

    fn tone(&mut self, duration: Duration) {
        println!("  BEEP ({} ms)", duration.as_millis());
    }
}
