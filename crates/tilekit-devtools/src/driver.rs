//! Headless driver: replays presses, keys, resizes and ticks against a router
//! the way a window's event loop would.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tilekit_router::{EventRouter, PendingUp};

#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Down { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Key(char),
    /// Each character of the string as a key.
    Text(String),
    Resize { width: f64, height: f64 },
    Tick(Duration),
    Draw,
}

/// What a run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub steps_run: usize,
    pub draws: usize,
    pub presses_taken: usize,
    pub releases_delivered: usize,
    pub stale_releases: usize,
    pub keys_consumed: usize,
    pub ticks_needing_redraw: usize,
    /// The run ended early because the router is shutting down.
    pub stopped: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Script {
    steps: Vec<Step>,
    verbose: bool,
}

fn number<T>(word: Option<&str>, line: usize, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let word = word.ok_or_else(|| anyhow!("line {line}: missing {what}"))?;
    word.parse()
        .with_context(|| format!("line {line}: bad {what} {word:?}"))
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one step per line:
    ///
    /// ```text
    /// down 10 10
    /// up 10 10
    /// key q
    /// text hello
    /// resize 800 600
    /// tick 50        # milliseconds
    /// draw
    /// ```
    ///
    /// Blank lines and text after `#` are ignored.
    pub fn parse(source: &str) -> Result<Self> {
        let mut script = Self::new();
        for (i, raw) in source.lines().enumerate() {
            let line = i + 1;
            let text = raw.split('#').next().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }
            let (command, rest) = text.split_once(' ').unwrap_or((text, ""));
            let mut words = rest.split_whitespace();
            let step = match command {
                "down" => Step::Down {
                    x: number(words.next(), line, "x")?,
                    y: number(words.next(), line, "y")?,
                },
                "up" => Step::Up {
                    x: number(words.next(), line, "x")?,
                    y: number(words.next(), line, "y")?,
                },
                "key" => {
                    let mut chars = rest.trim().chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Step::Key(c),
                        _ => bail!("line {line}: key takes a single character"),
                    }
                }
                "text" => Step::Text(rest.trim().to_string()),
                "resize" => Step::Resize {
                    width: number(words.next(), line, "width")?,
                    height: number(words.next(), line, "height")?,
                },
                "tick" => Step::Tick(Duration::from_millis(number(
                    words.next(),
                    line,
                    "interval",
                )?)),
                "draw" => Step::Draw,
                other => bail!("line {line}: unknown step {other:?}"),
            };
            script.steps.push(step);
        }
        Ok(script)
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Press and release at the same point.
    pub fn click(self, x: f64, y: f64) -> Self {
        self.step(Step::Down { x, y }).step(Step::Up { x, y })
    }

    pub fn text(self, text: &str) -> Self {
        self.step(Step::Text(text.to_string()))
    }

    pub fn draw(self) -> Self {
        self.step(Step::Draw)
    }

    /// Log at debug level while running.
    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Play the steps in order, stopping early once the router is shutting
    /// down. A press left pending at the end is abandoned.
    pub fn run(&self, router: &Arc<EventRouter>) -> Result<Report> {
        if self.verbose {
            let _ = env_logger::Builder::new()
                .filter_level(log::LevelFilter::Debug)
                .parse_default_env()
                .try_init();
        }
        let mut report = Report::default();
        let mut pressed: Option<PendingUp> = None;
        for (i, step) in self.steps.iter().enumerate() {
            if router.is_shutting_down() {
                log::info!("script stopped at step {i}, router is shutting down");
                report.stopped = true;
                break;
            }
            log::trace!("step {i}: {step:?}");
            match step {
                Step::Down { x, y } => {
                    if pressed.take().is_some() {
                        log::debug!("step {i}: previous press abandoned");
                    }
                    pressed = router.down_event(*x, *y);
                    if pressed.is_some() {
                        report.presses_taken += 1;
                    }
                }
                Step::Up { x, y } => {
                    if let Some(up) = pressed.take() {
                        if up.release(*x, *y) {
                            report.releases_delivered += 1;
                        } else {
                            report.stale_releases += 1;
                        }
                    }
                }
                Step::Key(ch) => {
                    if router.input_event(*ch) {
                        report.keys_consumed += 1;
                    }
                }
                Step::Text(text) => {
                    for ch in text.chars() {
                        if router.input_event(ch) {
                            report.keys_consumed += 1;
                        }
                    }
                }
                Step::Resize { width, height } => {
                    router
                        .resize(*width, *height)
                        .with_context(|| format!("step {i}: resize to {width}x{height}"))?;
                }
                Step::Tick(interval) => {
                    if router.tick(*interval) {
                        report.ticks_needing_redraw += 1;
                    }
                }
                Step::Draw => {
                    router.draw().with_context(|| format!("step {i}: draw"))?;
                    report.draws += 1;
                }
            }
            report.steps_run += 1;
        }
        Ok(report)
    }
}
