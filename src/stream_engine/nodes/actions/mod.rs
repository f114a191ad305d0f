pub mod console_output;
pub mod pipefy_node;
