/// Classification for retry policy.
///
/// Used to determine how the router should respond to errors from providers.
///
/// # Behavior Summary
///
/// | Class | Retry Same Provider? | Try Next Provider? |
/// |-------|---------------------|--------------------|
/// | `WithBackoff` | Yes (bounded, exponential) | Yes, after retries exhaust |
/// | `NextProvider` | No | Yes |
/// | `Never` | No | Yes (error was provider-specific) or terminal (aggregate) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Retry the same provider with exponential backoff before falling
    /// through.
    ///
    /// Used for rate limiting (429) and timeouts: the provider is healthy
    /// but momentarily pushing back, so a short bounded wait often
    /// succeeds. Total backoff per request is capped so a slow provider
    /// cannot hold a worker indefinitely.
    WithBackoff,

    /// Fall through to the next provider without retrying this one.
    ///
    /// Used when this provider failed in a way another provider is
    /// unlikely to share (transport fault, unparseable body).
    NextProvider,

    /// Never retry - bad symbol, unsupported kind, exhausted quota, or a
    /// terminal aggregate. The same request to the same provider cannot
    /// succeed today.
    Never,
}
