/// Output key holding the boolean outcome of a condition node.
pub const CONDITION_RESULT: &str = "result";
/// Output key naming the branch a condition node selected.
pub const CONDITION_BRANCH: &str = "branch";
pub const CONDITION_TRUE: &str = "true";
pub const CONDITION_FALSE: &str = "false";

/// Error code for configuration the action cannot use.
pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
/// Error code for an attempt that exceeded its node timeout.
pub const TIMEOUT: &str = "TIMEOUT";
