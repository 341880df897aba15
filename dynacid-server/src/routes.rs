//! HTTP adapter in front of the resolver. Every failure is answered with `{ "error": ... }`.
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use dynacid_core::classify::classify;
use dynacid_core::classify::Identifier;
use dynacid_core::Resolver;
use dynacid_core::ResolveError;
use dynacid_types::alias::AliasUpdate;
use dynacid_types::reply::AliasReply;
use dynacid_types::reply::ErrorReply;
use dynacid_types::reply::Resolution;
use serde_json::json;
use tracing::debug;
use tracing::warn;
use warp::http::StatusCode;
use warp::http::Uri;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::metrics::Metrics;

/// Update bodies are a CID and a URL; anything bigger is rejected before parsing.
const MAX_BODY_BYTES: u64 = 4 * 1024;

#[derive(Clone)]
struct State {
    resolver: Arc<Resolver>,
    metrics: Metrics,
}

pub fn routes(
    resolver: Arc<Resolver>,
    metrics: Metrics,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let state = State { resolver, metrics };
    let with_state = warp::any().map(move || state.clone());

    let favicon = warp::path!("favicon.ico")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({})));

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let register = warp::path!("alias")
        .and(warp::post())
        .and(with_state.clone())
        .and_then(register_alias);

    let update = warp::path!("alias" / String)
        .and(warp::put())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_state.clone())
        .and_then(update_alias);

    let resolve = warp::path!(String)
        .and(warp::get())
        .and(with_state)
        .and_then(resolve);

    favicon
        .or(health)
        .or(register)
        .or(update)
        .or(resolve)
        .recover(handle_rejection)
}

async fn resolve(
    identifier: String,
    state: State,
) -> Result<Response, Infallible> {
    let kind = match classify(&identifier) {
        Identifier::Alias(_) => "alias",
        Identifier::ContentPointer(_) => "pointer",
    };
    state.metrics.increment_resolutions(kind);

    let start = Instant::now();
    let result = state.resolver.resolve(&identifier).await;
    state
        .metrics
        .observe_resolution_duration(start.elapsed().as_secs_f64());

    Ok(match result {
        Ok(resolution) => resolution_reply(resolution),
        Err(err) => error_reply(&state, err),
    })
}

async fn register_alias(state: State) -> Result<Response, Infallible> {
    Ok(match state.resolver.register_alias().await {
        Ok(alias) => {
            state.metrics.increment_aliases_registered();
            warp::reply::with_status(warp::reply::json(&AliasReply { alias }), StatusCode::CREATED)
                .into_response()
        },
        Err(err) => error_reply(&state, err),
    })
}

async fn update_alias(
    alias: String,
    body: Bytes,
    state: State,
) -> Result<Response, Infallible> {
    let update = match serde_json::from_slice::<AliasUpdate>(&body) {
        Ok(update) => update,
        Err(err) => {
            return Ok(error_reply(
                &state,
                ResolveError::Validation(format!("invalid body: {err}")),
            ));
        },
    };

    Ok(match state.resolver.update_alias(&alias, update).await {
        Ok(value) => {
            state.metrics.increment_aliases_updated();
            warp::reply::json(&json!({ "value": value })).into_response()
        },
        Err(err) => error_reply(&state, err),
    })
}

/// Aliases with a redirect target answer with a redirect, unless the target is not a valid URI.
fn resolution_reply(resolution: Resolution) -> Response {
    if let Some(target) = &resolution.redirect {
        match target.parse::<Uri>() {
            Ok(uri) => return warp::redirect::found(uri).into_response(),
            Err(err) => warn!("ignoring invalid redirect target `{target}`: {err}"),
        }
    }

    warp::reply::json(&resolution).into_response()
}

fn status_of(err: &ResolveError) -> StatusCode {
    match err {
        ResolveError::Validation(_) => StatusCode::BAD_REQUEST,
        ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
        ResolveError::Upstream(_) | ResolveError::ContractCall(_) => StatusCode::BAD_GATEWAY,
        ResolveError::Encoding(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_reply(
    state: &State,
    err: ResolveError,
) -> Response {
    state.metrics.increment_errors(err.kind());
    debug!("request failed: {err}");

    warp::reply::with_status(
        warp::reply::json(&ErrorReply {
            error: err.to_string(),
        }),
        status_of(&err),
    )
    .into_response()
}

async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, error) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "no such route".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("body larger than {MAX_BODY_BYTES} bytes"),
        )
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            ResolveError::Validation("a JSON body with a content length is required".to_string())
                .to_string(),
        )
    } else {
        warn!("unhandled rejection: {rejection:?}");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    Ok(warp::reply::with_status(warp::reply::json(&ErrorReply { error }), status).into_response())
}
