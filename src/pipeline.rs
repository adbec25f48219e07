use eyre::WrapErr;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::decoder::decode_method;
use crate::methods::{MethodSpec, MethodTable};
use crate::records::TransactionRecord;
use crate::transaction_data::{fetch_calldata, CalldataSource};
use crate::writer::{write_decoded, FileNaming, OutputLayout};

/// What happened to a single CSV row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Not one of the recognized methods
    Skipped,
    /// Decoded and written to this file
    Written(PathBuf),
    /// Recognized, but the calldata could not be fetched or decoded
    Failed,
}

/// Row counts of one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows read
    pub rows: usize,
    /// Rows of a recognized method, `written + failed`
    pub matched: usize,
    /// Files written
    pub written: usize,
    /// Recognized rows whose calldata could not be fetched or decoded
    pub failed: usize,
    /// Rows of other methods
    pub skipped: usize,
}

/// Walks the CSV rows in order and turns every recognized call into a JSON file
pub struct Extractor<S> {
    source: S,
    methods: MethodTable,
    layout: OutputLayout,
    limiter: Option<DefaultDirectRateLimiter>,
    counters: HashMap<String, u64>,
}

impl<S: CalldataSource> Extractor<S> {
    /// Extractor without throttling; see [`Extractor::with_delay`]
    pub fn new(source: S, methods: MethodTable, layout: OutputLayout) -> Self {
        Extractor {
            source,
            methods,
            layout,
            limiter: None,
            counters: HashMap::new(),
        }
    }

    /// Minimum spacing between two remote calls; zero disables throttling
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.limiter = Quota::with_period(delay).map(RateLimiter::direct);
        self
    }

    /// The calldata source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Counter value of the last row of `label` processed in this run
    pub fn counter(&self, label: &str) -> u64 {
        self.counters.get(label).copied().unwrap_or(0)
    }

    /// Processes `records` in order and returns the counts
    pub async fn run(&mut self, records: &[TransactionRecord]) -> eyre::Result<RunSummary> {
        let mut summary = RunSummary::default();
        for record in records {
            summary.rows += 1;
            match self.process(record).await? {
                RowOutcome::Skipped => summary.skipped += 1,
                RowOutcome::Written(_) => {
                    summary.matched += 1;
                    summary.written += 1;
                }
                RowOutcome::Failed => {
                    summary.matched += 1;
                    summary.failed += 1;
                }
            }
        }
        info!(
            "Processed {} rows: {} matched, {} written, {} failed, {} skipped",
            summary.rows, summary.matched, summary.written, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    /// Handles one row; only filesystem errors are returned
    pub async fn process(&mut self, record: &TransactionRecord) -> eyre::Result<RowOutcome> {
        let Some(method) = self.methods.get(&record.method) else {
            debug!("Skipping {} ({})", record.tx_hash, record.method);
            return Ok(RowOutcome::Skipped);
        };
        let counter = next_counter(&mut self.counters, &self.layout, method)?;

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        let calldata = fetch_calldata(&self.source, &record.tx_hash).await;
        let Some(decoded) = decode_method(calldata.as_deref(), method) else {
            return Ok(RowOutcome::Failed);
        };

        let path = self.layout.file_path(method, counter, &record.tx_hash);
        write_decoded(&path, &decoded)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
        info!("Saved decoded input to {}", path.display());
        Ok(RowOutcome::Written(path))
    }
}

// The first row of a method prepares its directory and seeds the counter from what is on disk
fn next_counter(
    counters: &mut HashMap<String, u64>,
    layout: &OutputLayout,
    method: &MethodSpec,
) -> eyre::Result<u64> {
    if let Some(counter) = counters.get_mut(&method.label) {
        *counter += 1;
        return Ok(*counter);
    }

    let dir = layout.method_dir(method);
    fs::create_dir_all(&dir).wrap_err_with(|| format!("failed to create {}", dir.display()))?;
    let last = match layout.naming() {
        FileNaming::Counter => layout
            .last_index(method)
            .wrap_err_with(|| format!("failed to scan {}", dir.display()))?,
        FileNaming::TxHash => 0,
    };
    if last > 0 {
        info!(
            "Continuing {} after existing index {}",
            method.label, last
        );
    }
    counters.insert(method.label.clone(), last + 1);
    Ok(last + 1)
}
