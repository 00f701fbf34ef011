use tokio_util::sync::CancellationToken;

/// Per-request context handed to use-cases.
///
/// Carries the request id assigned at the edge and a cancellation token that
/// fires once the originating request is gone (client disconnect, server
/// timeout, or response written). Use-cases that spawn work should watch the
/// token; the transport never polls it.
#[derive(Debug, Clone, Default)]
pub struct RequestCtx {
    request_id: Option<String>,
    cancellation: CancellationToken,
}

impl RequestCtx {
    pub fn new(request_id: Option<String>, cancellation: CancellationToken) -> Self {
        Self {
            request_id,
            cancellation,
        }
    }

    /// Context not bound to any request. Never cancelled unless the caller
    /// cancels the returned token.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the request has been cancelled.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }
}
