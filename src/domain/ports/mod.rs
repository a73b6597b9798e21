//! Ports (trait interfaces) the governor consumes.

pub mod action_executor;
pub mod clock;
pub mod contact_gate;
pub mod page_inspector;
pub mod state_repository;
pub mod task_repository;

pub use action_executor::{ActionExecutor, ActionOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use contact_gate::{AllowAllContacts, ContactGate};
pub use page_inspector::{PageSignalInspector, PageSnapshot};
pub use state_repository::{QuotaStateRepository, SafetySnapshot, SafetyStateRepository};
pub use task_repository::{TaskCounts, TaskFilters, TaskRepository};
