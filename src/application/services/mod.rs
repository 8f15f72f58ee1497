pub mod audit_service;
pub mod reconciler;

pub use audit_service::{AuditReport, AuditService};
