//! Observability for the SSO gate.
//!
//! Metrics are emitted through the `metrics` facade; the host application
//! decides which recorder (if any) to install.

pub mod metrics;
