//! Case lifecycle: status graph, triggers and guarded transitions

pub mod machine;
pub mod status;

pub use machine::{check_guard, plan_transition, GuardContext};
pub use status::{is_backward_edge, CaseStatus, CaseTrigger, Transition, TriggerSource, TRANSITIONS};
