//! Terminal progress bar fed by the engine's progress notifications.

use crate::scanner::ScanProgress;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Progress bar over the total task count; hidden when disabled.
pub struct ScanProgressBar {
    bar: ProgressBar,
}

impl ScanProgressBar {
    pub fn new(total: usize, enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_message("Open: 0");
        Self { bar }
    }

    /// Move the bar to the latest snapshot.
    pub fn update(&self, progress: ScanProgress) {
        self.bar.set_position(progress.completed as u64);
        self.bar.set_message(format!("Open: {}", progress.open));
    }

    pub fn finish(&self, interrupted: bool) {
        if interrupted {
            self.bar.abandon_with_message("interrupted");
        } else {
            self.bar.finish_and_clear();
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
