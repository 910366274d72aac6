//! Observability setup for the campus chat server: structured logging with
//! optional OpenTelemetry span export.

pub mod tracing_setup;
