use crate::wire::{ExtenderArgs, ExtenderBindingArgs, ExtenderFilterResult};
use crate::{ApiError, AppState, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// POST /predicates/ers
///
/// Always answers 200 with a JSON result; problems are reported in its
/// `error` field. Only a failure to encode the result is a 500.
pub async fn filter(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let result = match serde_json::from_slice::<ExtenderArgs>(&body) {
        Ok(args) => run_filter(&state, args).await,
        Err(e) => {
            warn!("Malformed filter request: {}", e);
            ExtenderFilterResult::error(format!("failed to decode extender args: {}", e))
        }
    };

    match serde_json::to_vec(&result) {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode filter result: {}", e);
            ApiError::Internal(e.to_string()).into_response()
        }
    }
}

async fn run_filter(state: &AppState, args: ExtenderArgs) -> ExtenderFilterResult {
    let Some(nodes) = args.nodes else {
        return ExtenderFilterResult::error(if args.node_names.is_some() {
            "node names without node objects are not supported; disable nodeCacheCapable"
        } else {
            "no candidate nodes in extender args"
        });
    };

    debug!(
        "Filtering {} node(s) for pod {}/{}",
        nodes.items.len(),
        args.pod.namespace(),
        args.pod.name()
    );

    let result = state.scheduler.filter(&args.pod, &nodes.items).await;
    info!(
        "Pod {}/{}: {} schedulable node(s)",
        args.pod.namespace(),
        args.pod.name(),
        result.schedulable_nodes.len()
    );
    result.into()
}

/// POST /bind/ers
pub async fn bind(State(state): State<Arc<AppState>>, body: Bytes) -> Result<StatusCode> {
    let args: ExtenderBindingArgs = serde_json::from_slice(&body)?;

    state
        .scheduler
        .bind(&args.pod_namespace, &args.pod_name, &args.pod_uid, &args.node)
        .await?;

    Ok(StatusCode::OK)
}
