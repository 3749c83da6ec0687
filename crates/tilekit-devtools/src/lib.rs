//! Developer tools: a draw recorder, a frame inspector and a headless driver.

mod driver;

pub use driver::{Report, Script, Step};
pub use tilekit_core::same_dump;

use tilekit_core::{Dimensions, DrawData, DrawProtocol};

/// Wraps a draw protocol and keeps a copy of every record it is asked to
/// draw.
#[derive(Debug, Default)]
pub struct Recorder<P> {
    inner: P,
    records: Vec<DrawData>,
    measurements: usize,
    failed_measurements: usize,
}

impl<P: DrawProtocol> Recorder<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            records: Vec::new(),
            measurements: 0,
            failed_measurements: 0,
        }
    }

    pub fn records(&self) -> &[DrawData] {
        &self.records
    }

    /// Hand out the records so far and start over.
    pub fn take(&mut self) -> Vec<DrawData> {
        self.measurements = 0;
        self.failed_measurements = 0;
        std::mem::take(&mut self.records)
    }

    pub fn measurements(&self) -> usize {
        self.measurements
    }

    pub fn failed_measurements(&self) -> usize {
        self.failed_measurements
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }
}

impl<P: DrawProtocol> DrawProtocol for Recorder<P> {
    fn draw(&mut self, data: &DrawData) -> bool {
        self.records.push(data.clone());
        self.inner.draw(data)
    }

    fn get_text_metrics(
        &mut self,
        bounds: &mut Dimensions,
        char_size: &mut u16,
        data: &DrawData,
        upper_limit: u16,
    ) -> bool {
        self.measurements += 1;
        let ok = self.inner.get_text_metrics(bounds, char_size, data, upper_limit);
        if !ok {
            self.failed_measurements += 1;
        }
        ok
    }
}

/// Frame counter and the counts of the last frame.
#[derive(Clone, Debug, Default)]
pub struct Hud {
    frame_count: u64,
    pub metrics: Option<Metrics>,
}

impl Hud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Count a frame and return the status line for it.
    pub fn tick(&mut self) -> String {
        self.frame_count += 1;
        let mut parts = vec![format!("frame: {}", self.frame_count)];
        if let Some(m) = &self.metrics {
            parts.push(format!("drawn: {}", m.widgets_drawn));
            parts.push(format!("measured: {}", m.measurements));
        }
        parts.join("  |  ")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Metrics {
    pub widgets_drawn: usize,
    pub measurements: usize,
}

/// Renders what a frame drew as text, one line per widget.
pub struct Inspector {
    pub hud: Hud,
    pub enabled: bool,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            hud: Hud::new(),
            enabled: true,
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Summarize the frame a recorder captured and reset the recorder.
    pub fn frame<P: DrawProtocol>(&mut self, recorder: &mut Recorder<P>) -> Option<String> {
        let measurements = recorder.measurements();
        let records = recorder.take();
        if !self.enabled {
            return None;
        }
        self.hud.metrics = Some(Metrics {
            widgets_drawn: records.len(),
            measurements,
        });
        let mut out = self.hud.tick();
        out.push('\n');
        out.push_str(&Self::summary(&records));
        Some(out)
    }

    pub fn summary(records: &[DrawData]) -> String {
        let mut out = String::new();
        for d in records {
            let r = d.rect;
            out.push_str(&format!(
                "{} #{} ({}, {}, {}x{}) border {}",
                d.class, d.id, r.ux, r.uy, r.width, r.height, r.border
            ));
            if !d.label.is_empty() {
                out.push_str(&format!(" {:?} @{}", d.label, d.char_size));
            }
            if d.selected {
                out.push_str(" selected");
            }
            out.push('\n');
        }
        out
    }
}
