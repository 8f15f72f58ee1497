/// Per-run trace id shared by every log line of one audit run
pub struct TraceContext;

impl TraceContext {
    /// New trace id (UUID v4)
    pub fn new_trace_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Short form for console output (first UUID group)
    pub fn short(trace_id: &str) -> &str {
        trace_id.split('-').next().unwrap_or(trace_id)
    }
}
