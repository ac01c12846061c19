//! Fault-tolerant batch consumer: buffering, retry with exponential
//! backoff, a dead-letter queue, and checkpointing to disk.
//!
//! Grounded on `original_source/fault_tolerant_example.py`'s
//! `FaultTolerantBatchConsumer`. The original writes completed
//! batches to Parquet via Polars/PyArrow; neither the teacher nor the
//! wider example pack carries a Parquet-writing crate, so this demo
//! writes NDJSON instead (`serde_json`, one JSON object per line),
//! which is this *consumer's* concern, not the bus's (spec.md §6).
//! All of the retry/DLQ/checkpoint logic lives inside the consumer,
//! layered on top of the bus's own skip-and-continue policy for a
//! failing `consume` call (spec.md §9, `DESIGN.md`).

#[path = "support/mod.rs"]
mod support;

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use ringcast::{Consumer, Dispatcher, DispatcherConfig, Result};

struct FaultTolerantBatchConsumer {
    name: String,
    batch_size: usize,
    buffer: Vec<Value>,
    file_counter: usize,
    processed_count: usize,
    error_count: usize,
    retry_count: usize,
    max_retries: usize,
    retry_delay: Duration,
    consumer_dir: PathBuf,
    dlq_dir: PathBuf,
    checkpoint_file: PathBuf,
    simulated_failures: Arc<AtomicUsize>,
}

impl FaultTolerantBatchConsumer {
    fn new(name: &str, output_dir: &Path, batch_size: usize) -> std::io::Result<Self> {
        let consumer_dir = output_dir.join(name.replace(' ', "_").to_lowercase());
        let dlq_dir = consumer_dir.join("dlq");
        fs::create_dir_all(&consumer_dir)?;
        fs::create_dir_all(&dlq_dir)?;

        let checkpoint_file = consumer_dir.join("checkpoint.json");
        let (file_counter, processed_count) = load_checkpoint(&checkpoint_file);

        tracing::info!(consumer = name, dir = %consumer_dir.display(), "initialized");

        Ok(Self {
            name: name.to_string(),
            batch_size,
            buffer: Vec::new(),
            file_counter,
            processed_count,
            error_count: 0,
            retry_count: 0,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            consumer_dir,
            dlq_dir,
            checkpoint_file,
            simulated_failures: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn save_checkpoint(&self) {
        let checkpoint = serde_json::json!({
            "last_batch_number": self.file_counter,
            "processed_count": self.processed_count,
        });
        if let Ok(mut f) = File::create(&self.checkpoint_file) {
            let _ = f.write_all(checkpoint.to_string().as_bytes());
        }
    }

    fn process_batch_with_retry(&mut self, batch: Vec<Value>) {
        let mut attempt = 0;
        loop {
            match self.process_batch(&batch) {
                Ok(()) => return,
                Err(reason) => {
                    tracing::error!(
                        consumer = %self.name,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        %reason,
                        "batch processing failed"
                    );
                    if attempt >= self.max_retries {
                        self.error_count += 1;
                        self.send_to_dlq(&batch, &reason);
                        return;
                    }
                    let delay = self.retry_delay * 2u32.pow(attempt as u32);
                    tracing::info!(consumer = %self.name, ?delay, "retrying");
                    std::thread::sleep(delay);
                    self.retry_count += 1;
                    attempt += 1;
                }
            }
        }
    }

    /// Write one NDJSON batch file. A 1-in-20 simulated failure keeps
    /// the retry/DLQ path exercised, mirroring the original's `5%`
    /// `random.random() < 0.05` fault injection.
    fn process_batch(&mut self, batch: &[Value]) -> std::result::Result<(), String> {
        let attempt_no = self.simulated_failures.fetch_add(1, Ordering::Relaxed);
        if attempt_no % 20 == 0 {
            return Err("simulated processing error".to_string());
        }

        self.file_counter += 1;
        let filename = format!("batch_{:04}.ndjson", self.file_counter);
        let filepath = self.consumer_dir.join(&filename);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&filepath)
            .map_err(|e| e.to_string())?;

        for item in batch {
            writeln!(file, "{item}").map_err(|e| e.to_string())?;
        }

        self.processed_count += batch.len();
        self.save_checkpoint();

        tracing::info!(
            consumer = %self.name,
            batch = self.file_counter,
            items = batch.len(),
            total = self.processed_count,
            errors = self.error_count,
            file = %filename,
            "batch written"
        );
        Ok(())
    }

    fn send_to_dlq(&self, batch: &[Value], error_message: &str) {
        let entry = serde_json::json!({
            "error": error_message,
            "batch_size": batch.len(),
            "data": batch,
        });
        let filename = format!("dlq_batch_{}.json", self.file_counter);
        let filepath = self.dlq_dir.join(filename);
        if let Ok(mut f) = File::create(&filepath) {
            let _ = f.write_all(entry.to_string().as_bytes());
        }
        tracing::warn!(consumer = %self.name, path = %filepath.display(), "batch sent to DLQ");
    }
}

fn load_checkpoint(path: &Path) -> (usize, usize) {
    let Ok(contents) = fs::read_to_string(path) else {
        return (0, 0);
    };
    let Ok(value) = serde_json::from_str::<Value>(&contents) else {
        return (0, 0);
    };
    let file_counter = value["last_batch_number"].as_u64().unwrap_or(0) as usize;
    let processed_count = value["processed_count"].as_u64().unwrap_or(0) as usize;
    (file_counter, processed_count)
}

impl Consumer<Value> for FaultTolerantBatchConsumer {
    fn consume(&mut self, batch: &[Value]) -> Result<()> {
        self.buffer.extend_from_slice(batch);
        while self.buffer.len() >= self.batch_size {
            let ready: Vec<Value> = self.buffer.drain(..self.batch_size).collect();
            self.process_batch_with_retry(ready);
        }
        Ok(())
    }

    fn close(&mut self) {
        if !self.buffer.is_empty() {
            let remaining = std::mem::take(&mut self.buffer);
            tracing::info!(consumer = %self.name, count = remaining.len(), "processing final partial batch");
            self.process_batch_with_retry(remaining);
        }
        tracing::info!(
            consumer = %self.name,
            processed = self.processed_count,
            errors = self.error_count,
            retries = self.retry_count,
            "finished"
        );
    }
}

fn custom_error_handler(consumer: &str, batch: &[Value], error: &ringcast::BusError) {
    tracing::error!(consumer, batch_len = batch.len(), %error, "dispatcher error handler invoked");
}

fn main() -> Result<()> {
    support::logging::init();

    support::timing::measure("demo_fault_tolerant::main", || -> Result<()> {
        let output_dir = PathBuf::from("data");

        let bus: Dispatcher<Value> = Dispatcher::with_error_handler(
            DispatcherConfig::new(2048)?.with_name("FaultTolerantExample"),
            Box::new(custom_error_handler),
        )?;

        let consumer_one = FaultTolerantBatchConsumer::new("FT-Consumer-1", &output_dir, 100)
            .map_err(|e| ringcast::BusError::unexpected(e.to_string()))?;
        let consumer_two = FaultTolerantBatchConsumer::new("FT-Consumer-2", &output_dir, 100)
            .map_err(|e| ringcast::BusError::unexpected(e.to_string()))?;

        bus.register_consumer("FT-Consumer-1", Box::new(consumer_one))?;
        bus.register_consumer("FT-Consumer-2", Box::new(consumer_two))?;

        tracing::info!("starting fault-tolerant batch processing");

        let total_objects = 1_000;
        for i in 0..total_objects {
            let obj = support::json_gen::generate_complex_json();
            bus.produce(vec![obj])?;
            if (i + 1) % 100 == 0 {
                tracing::info!(produced = i + 1, total = total_objects, "progress");
            }
        }

        tracing::info!("all objects produced, waiting for consumers to finish");
        std::thread::sleep(Duration::from_secs(5));

        bus.close();
        tracing::info!("dispatcher closed");
        Ok(())
    })
}
