use std::sync::Mutex;

use dorado_core::pipeline::{PipelineStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};

/// One progress bar per stage. Stages without an item count get a spinner.
pub struct BarReporter {
    current: Mutex<Option<(PipelineStage, ProgressBar)>>,
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        let bar = match total_items {
            Some(total) => {
                let bar = ProgressBar::new(total as u64);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{msg:24} [{bar:40}] {pos}/{len}")
                {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_message(stage.to_string());
        if let Ok(mut current) = self.current.lock() {
            if let Some((_, old)) = current.replace((stage, bar)) {
                old.finish_and_clear();
            }
        }
    }

    fn advance(&self, items_done: usize) {
        if let Ok(current) = self.current.lock() {
            if let Some((_, bar)) = current.as_ref() {
                // Parallel stages can report out of order
                if bar.position() < items_done as u64 {
                    bar.set_position(items_done as u64);
                }
            }
        }
    }

    fn finish_stage(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some((stage, bar)) = current.take() {
                bar.finish_with_message(format!("{stage} done"));
            }
        }
    }
}
