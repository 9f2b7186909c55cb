//! sea-orm entities for the automations service.
//!
//! `automation_rules` and `automation_log` are owned by this service (see the
//! sibling migration crate). `leads`, `customers`, `policies` and
//! `message_templates` belong to the record-management subsystem; the engine
//! only ever reads them, so their entities are declared here without
//! migrations.

pub mod automation_log;
pub mod automation_rules;
pub mod customers;
pub mod leads;
pub mod message_templates;
pub mod policies;
