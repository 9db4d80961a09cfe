//! Render `tracing` events into concise logfmt strings.

use std::fmt::{Debug, Write};

use tracing::{
    Event, Level, Metadata,
    field::{Field, Visit},
};

/// Level, target and message pulled out of a tracing event.
#[derive(Debug, Clone)]
pub struct RenderedLog {
    /// Severity of the event.
    pub level: Level,
    /// Event target (usually the module path).
    pub target: String,
    /// The `message` field, or the remaining fields as `key=value` pairs.
    pub message: String,
}

impl RenderedLog {
    /// Crate component of the target, e.g. `relocate` for `relocate::engine`.
    pub fn source(&self) -> &str {
        self.target.split("::").next().unwrap_or(&self.target)
    }
}

/// Fields seen while visiting an event.
struct MsgVisitor {
    /// Captured `message` field, if present.
    msg: Option<String>,
    /// Non-message fields rendered as `key=value`.
    fields: String,
}

impl Visit for MsgVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.msg = Some(value.to_string());
        } else {
            let _ignored = write!(&mut self.fields, "{}=\"{}\" ", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.msg = Some(format!("{value:?}"));
        } else {
            let _ignored = write!(&mut self.fields, "{}={:?} ", field.name(), value);
        }
    }
}

/// Extract level, target and message from `event`.
///
/// The message is followed by any structured fields, so `error!(node = 3,
/// "gone")` renders as `gone node=3`. Events without a message render their
/// fields only.
pub fn render_event(event: &Event<'_>) -> RenderedLog {
    let meta: &Metadata<'_> = event.metadata();
    let mut vis = MsgVisitor {
        msg: None,
        fields: String::new(),
    };
    event.record(&mut vis);
    let fields = vis.fields.trim_end();
    let message = match vis.msg {
        Some(msg) if fields.is_empty() => msg,
        Some(msg) => format!("{msg} {fields}"),
        None => fields.to_string(),
    };
    RenderedLog {
        level: *meta.level(),
        target: meta.target().to_string(),
        message,
    }
}
