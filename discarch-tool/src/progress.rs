use std::time::Duration;

use discarch::Progress;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar on stderr, one bar per unit of work.
pub(crate) struct BarProgress {
    bar: Option<ProgressBar>,
    unit: Unit,
}

#[derive(Clone, Copy)]
pub(crate) enum Unit {
    Bytes,
    Sectors,
}

impl BarProgress {
    pub(crate) fn new(unit: Unit) -> Self {
        BarProgress { bar: None, unit }
    }

    fn style(&self) -> ProgressStyle {
        let template = match self.unit {
            Unit::Bytes => {
                "  {msg:.dim} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})"
            }
            Unit::Sectors => "  {msg:.dim} [{bar:40.cyan/blue}] {pos}/{len} sectors ({eta})",
        };
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }
}

impl Progress for BarProgress {
    fn start(&mut self, label: &str, total: u64) {
        let bar = ProgressBar::new(total);
        bar.set_style(self.style());
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Some(previous) = self.bar.replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn advance(&mut self, done: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(done);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
