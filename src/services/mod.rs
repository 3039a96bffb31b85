//! Background and side-effect services

pub mod audit_trail;

pub use audit_trail::AuditTrail;
