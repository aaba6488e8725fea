//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!     → monitor.rs (security events kept for the admin report)
//!
//! Consumers:
//!     → stdout (human or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//!     → GET /api/admin/security
//! ```

pub mod logging;
pub mod metrics;
pub mod monitor;

pub use monitor::{
    EventLevel, RequestContext, SecurityEvent, SecurityEventKind, SecurityMetrics,
    SecurityMonitor,
};
