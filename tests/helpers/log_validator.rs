use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Captured log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    #[allow(dead_code)]
    pub target: String,
}

/// Custom layer that captures logs for validation
pub struct LogCaptureLayer {
    logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl LogCaptureLayer {
    pub fn new(logs: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        Self { logs }
    }
}

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let entry = LogEntry {
            level: *metadata.level(),
            message: visitor.message,
            target: metadata.target().to_string(),
        };

        self.logs.lock().unwrap().push(entry);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
            // Remove quotes from debug format
            if self.message.starts_with('"') && self.message.ends_with('"') {
                self.message = self.message[1..self.message.len() - 1].to_string();
            }
        }
    }
}

/// Log validator for integration tests
pub struct LogValidator {
    logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl LogValidator {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the capture layer for the subscriber
    pub fn layer(&self) -> LogCaptureLayer {
        LogCaptureLayer::new(Arc::clone(&self.logs))
    }

    /// Get all captured logs
    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.logs.lock().unwrap().clone()
    }

    /// Whether any entry at `level` contains `pattern`
    pub fn contains(&self, level: Level, pattern: &str) -> bool {
        self.get_logs()
            .iter()
            .any(|log| log.level == level && log.message.contains(pattern))
    }

    /// Validate that each `(pattern, description)` appears in some log line
    pub fn validate(&self, expected_patterns: &[(&str, &str)]) -> ValidationResult {
        let logs = self.get_logs();
        let mut result = ValidationResult::new();

        for (pattern, description) in expected_patterns {
            if !logs.iter().any(|log| log.message.contains(pattern)) {
                result
                    .missing_logs
                    .push(format!("{}: '{}'", description, pattern));
            } else {
                result.found_logs.push(description.to_string());
            }
        }

        self.validate_quality(&logs, &mut result);

        result
    }

    /// Failures must never be logged below WARN
    fn validate_quality(&self, logs: &[LogEntry], result: &mut ValidationResult) {
        let mut issues = Vec::new();

        for log in logs {
            if (log.message.contains("Failed") || log.message.contains("failed"))
                && log.level != Level::ERROR
                && log.level != Level::WARN
            {
                issues.push(format!(
                    "Failure message should be ERROR or WARN: {}",
                    log.message
                ));
            }
        }

        result.quality_issues = issues;
    }

    /// Print a summary of validation results
    pub fn print_summary(&self, result: &ValidationResult) {
        println!("\nLog Validation Summary");
        println!("Found {} expected log patterns", result.found_logs.len());
        println!("Missing {} expected log patterns", result.missing_logs.len());
        println!("Quality issues: {}", result.quality_issues.len());
        println!("Total logs captured: {}", self.logs.lock().unwrap().len());

        for missing in &result.missing_logs {
            println!("  missing: {}", missing);
        }
        for issue in &result.quality_issues {
            println!("  issue: {}", issue);
        }
    }

    /// Get statistics about log levels
    pub fn get_stats(&self) -> LogStats {
        let logs = self.get_logs();
        LogStats {
            total: logs.len(),
            error: logs.iter().filter(|l| l.level == Level::ERROR).count(),
            warn: logs.iter().filter(|l| l.level == Level::WARN).count(),
            info: logs.iter().filter(|l| l.level == Level::INFO).count(),
            debug: logs.iter().filter(|l| l.level == Level::DEBUG).count(),
        }
    }
}

#[derive(Debug)]
pub struct ValidationResult {
    pub found_logs: Vec<String>,
    pub missing_logs: Vec<String>,
    pub quality_issues: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            found_logs: Vec::new(),
            missing_logs: Vec::new(),
            quality_issues: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.missing_logs.is_empty() && self.quality_issues.is_empty()
    }
}

#[derive(Debug)]
pub struct LogStats {
    pub total: usize,
    pub error: usize,
    pub warn: usize,
    pub info: usize,
    pub debug: usize,
}
