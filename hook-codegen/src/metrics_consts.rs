pub const SAMPLES_UNIFIED: &str = "hook_codegen_samples_total";
pub const SAMPLES_RESOLVED: &str = "hook_codegen_samples_resolved";
pub const GENERATE_TOTAL: &str = "hook_codegen_generate_total";
pub const GENERATE_TIME: &str = "hook_codegen_generate_time_ms";
