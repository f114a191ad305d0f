pub mod actions;
pub mod triggers;

pub use actions::console_output::ConsoleOutputNode;
pub use actions::pipefy_node::{PipefyNode, PipefyOperation};
pub use triggers::pipefy_trigger::{
    HookOutcome, PipefyTrigger, PipefyTriggerConfig, RegistrationState, TriggerAction,
};
pub use triggers::lifecycle::WebhookLifecycle;
