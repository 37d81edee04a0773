//! Webhook receiver.
//!
//! `POST /webhooks/github/{user}` verifies the delivery signature against
//! the raw body, then feeds the event through the same upsert path the sync
//! engine uses. The 200 response only acknowledges receipt: duplicates,
//! ignored actions, and parked events all acknowledge, because the host
//! only needs to know whether to redeliver.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::post;
use serde_json::{Value, json};

use forgemirror::webhook::{IngestOutcome, RawDelivery, ingest_webhook};

use super::{ApiError, AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/webhooks/github/{user}", post(receive))
}

async fn receive(
    State(state): State<AppState>,
    Path(user): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let secret = state
        .config
        .webhook
        .secret
        .as_deref()
        .ok_or_else(|| ApiError::internal("webhook secret is not configured"))?;

    let delivery_id = header_str(&headers, "x-github-delivery")
        .ok_or_else(|| ApiError::bad_request("missing X-GitHub-Delivery header"))?;
    let event = header_str(&headers, "x-github-event")
        .ok_or_else(|| ApiError::bad_request("missing X-GitHub-Event header"))?;
    let signature = header_str(&headers, "x-hub-signature-256");

    let delivery = RawDelivery {
        delivery_id,
        event,
        signature,
        body: &body,
    };
    let outcome =
        ingest_webhook(&state.db, secret, &state.config.retry_policy(), &user, delivery).await?;

    match outcome {
        IngestOutcome::Applied => {
            tracing::debug!("delivery {delivery_id} ({event}) for {user}: applied");
        }
        IngestOutcome::Duplicate => {
            tracing::debug!("delivery {delivery_id} ({event}) for {user}: already processed");
        }
        IngestOutcome::Deferred => {
            tracing::info!("delivery {delivery_id} ({event}) for {user}: parked until its parent arrives");
        }
        IngestOutcome::Ignored => {
            tracing::debug!("delivery {delivery_id} ({event}) for {user}: nothing to mirror");
        }
    }

    Ok(Json(json!({"received": true})))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
