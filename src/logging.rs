use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

/// Collects one formatted event and hands it to `sink` when dropped
pub struct LineWriter<F: Fn(&str)> {
    buf: Vec<u8>,
    sink: F,
}

impl<F: Fn(&str)> Write for LineWriter<F> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<F: Fn(&str)> Drop for LineWriter<F> {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        (self.sink)(line.trim_end());
    }
}

/// `MakeWriter` that gives each event its own [`LineWriter`]
#[derive(Clone)]
pub struct LineSink<F> {
    sink: F,
}

impl<F: Fn(&str) + Clone> LineSink<F> {
    pub fn new(sink: F) -> Self {
        Self { sink }
    }
}

impl<'a, F: Fn(&str) + Clone + 'a> MakeWriter<'a> for LineSink<F> {
    type Writer = LineWriter<F>;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            buf: Vec::new(),
            sink: self.sink.clone(),
        }
    }
}

fn console_log(line: &str) {
    web_sys::console::log_1(&line.into());
}

/// Route `tracing` events to the browser console.
///
/// Returns false if a global subscriber was already set.
pub fn install_console_logging() -> bool {
    let sink: fn(&str) = console_log;
    tracing_subscriber::fmt()
        .with_writer(LineSink::new(sink))
        .without_time()
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Simulation;
    use crate::types::UnlockConfig;
    use std::sync::{Arc, Mutex};

    fn capture() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Clone + Send + Sync + 'static) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        let sink = move |line: &str| sink_lines.lock().unwrap().push(line.to_string());
        (lines, sink)
    }

    #[test]
    fn test_each_event_becomes_one_line() {
        let (lines, sink) = capture();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(LineSink::new(sink))
            .without_time()
            .with_target(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(avg_attempts = 2.5, "Unlock simulation finished");
            tracing::warn!(attempts = 10u64, "Sample hit attempt cap");
        });

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Unlock simulation finished"));
        assert!(lines[0].contains("avg_attempts=2.5"));
        assert!(lines[1].contains("WARN"));
        assert!(lines.iter().all(|line| !line.ends_with('\n')));
    }

    #[test]
    fn test_simulation_run_is_logged() {
        let (lines, sink) = capture();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(LineSink::new(sink))
            .without_time()
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let config = UnlockConfig::default()
                .with_chogall_chance(1.0)
                .with_num_samples(10);
            Simulation::new(config, 1).unwrap().run().unwrap();
        });

        let lines = lines.lock().unwrap();
        assert!(lines.iter().any(|line| line.contains("Starting unlock simulation")));
        assert!(lines.iter().any(|line| line.contains("Unlock simulation finished")));
        // debug and trace events stay below the INFO filter
        assert!(!lines.iter().any(|line| line.contains("Sample unlocked")));
    }

    #[test]
    fn test_empty_writer_emits_nothing() {
        let (lines, sink) = capture();
        drop(LineSink::new(sink).make_writer());
        assert!(lines.lock().unwrap().is_empty());
    }
}
