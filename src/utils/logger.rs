use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

/// The fields dispatch events carry. Anything else an event records is
/// dropped from the JSON record.
#[derive(Default)]
struct DispatchFields {
    message: Option<String>,
    event_name: Option<String>,
    route: Option<String>,
    error_kind: Option<String>,
    status: Option<u64>,
}

impl DispatchFields {
    fn set(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "event_name" => self.event_name = Some(value),
            "route" => self.route = Some(value),
            "error_kind" => self.error_kind = Some(value),
            _ => {}
        }
    }

    /// Attribute keys follow OpenTelemetry semantic conventions.
    fn into_attributes(self) -> Map<String, Value> {
        let mut attributes = Map::new();
        let entries = [
            ("event.name", self.event_name.map(Value::from)),
            ("http.route", self.route.map(Value::from)),
            ("error.type", self.error_kind.map(Value::from)),
            ("http.response.status_code", self.status.map(Value::from)),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                attributes.insert(key.to_string(), value);
            }
        }
        attributes
    }
}

impl Visit for DispatchFields {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "status" {
            self.status = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.set(field, format!("{:?}", value));
    }
}

/// Writes one OpenTelemetry-shaped JSON log record per event.
#[derive(Clone)]
struct LogRecordFormatter {
    resource: Value,
}

impl LogRecordFormatter {
    fn new(config: &LoggingConfig) -> Self {
        LogRecordFormatter {
            resource: json!({
                "service.name": config.service_name,
                "service.version": config.service_version,
            }),
        }
    }

    fn severity_number(level: &Level) -> u64 {
        match *level {
            Level::TRACE => 1,
            Level::DEBUG => 5,
            Level::INFO => 9,
            Level::WARN => 13,
            Level::ERROR => 17,
        }
    }

    fn record(&self, event: &Event<'_>) -> Value {
        let metadata = event.metadata();
        let mut fields = DispatchFields::default();
        event.record(&mut fields);

        let body = fields
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut attributes = fields.into_attributes();
        attributes.insert("code.target".to_string(), Value::from(metadata.target()));

        json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "severity_text": metadata.level().as_str(),
            "severity_number": Self::severity_number(metadata.level()),
            "body": body,
            "resource": self.resource,
            "attributes": attributes,
        })
    }
}

impl<S, N> FormatEvent<S, N> for LogRecordFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let serialized = serde_json::to_string(&self.record(event)).map_err(|_| std::fmt::Error)?;
        writeln!(writer, "{}", serialized)
    }
}

/// Parse `logging.level`.
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            other
        )),
    }
}

/// Install the global tracing subscriber: JSON log records when
/// `logging.format` is "json", human-readable output otherwise.
/// `RUST_LOG` directives are layered on top of the configured level.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), String> {
    let level_filter = parse_level(&logging_config.level)?;
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let installed = match logging_config.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().event_format(LogRecordFormatter::new(logging_config)))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().pretty())
            .try_init(),
    };
    installed.map_err(|e| format!("Failed to install logger: {}", e))
}
