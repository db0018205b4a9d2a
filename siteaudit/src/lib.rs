// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{render_report, resolve_output_path, summary_line};

// Re-export audit functionality from siteaudit-core
pub use siteaudit_core::audit::{AuditOptions, AuditProgressCallback, execute_audit};
pub use siteaudit_core::report::{Report, ReportFormat};
