use anyhow::Result;
use tracing::{debug, warn};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub batches: usize,
    pub processed: usize,
    pub failed_batches: usize,
    pub failed_items: usize,
}

/// Applies an operation to fixed-size contiguous groups in order. A failing
/// group is logged and counted; later groups still run.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    batch_size: usize,
}

impl BatchExecutor {
    pub fn new(batch_size: usize) -> Result<Self, PipelineError> {
        if batch_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "batch size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { batch_size })
    }

    pub fn run<T, F>(&self, label: &str, items: &[T], mut op: F) -> BatchReport
    where
        F: FnMut(&[T]) -> Result<usize>,
    {
        let mut report = BatchReport::default();
        let total_batches = items.len().div_ceil(self.batch_size);

        for (index, group) in items.chunks(self.batch_size).enumerate() {
            report.batches += 1;
            match op(group) {
                Ok(count) => {
                    report.processed += count;
                    debug!(
                        label,
                        batch = index + 1,
                        total_batches,
                        processed = report.processed,
                        total_items = items.len(),
                        "batch completed"
                    );
                }
                Err(err) => {
                    report.failed_batches += 1;
                    report.failed_items += group.len();
                    warn!(
                        label,
                        batch = index + 1,
                        total_batches,
                        items = group.len(),
                        error = %format!("{err:#}"),
                        "batch failed; continuing with next batch"
                    );
                }
            }
        }

        report
    }
}
