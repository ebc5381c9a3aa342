/// GET /
pub async fn welcome() -> &'static str {
    "This is k8s extended resource scheduler"
}

/// Health check endpoint
pub async fn healthz() -> &'static str {
    "ok"
}

/// Readiness probe
pub async fn readyz() -> &'static str {
    "ok"
}
