pub mod lifecycle;
pub mod pipefy_trigger;
