//! Podcast metadata endpoints.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::http::server::AppState;
use crate::proxy::error::error_response;

/// Default and upper bound for `max` on the episodes route.
pub const DEFAULT_MAX_EPISODES: u32 = 50;
pub const MAX_EPISODES_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodesQuery {
    pub max: Option<u32>,
}

/// Extractor failures get the same JSON body and 422 as the explicit checks.
fn unprocessable(detail: String) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, detail)
}

fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, Response> {
    path.map(|Path(id)| id)
        .map_err(|rejection| unprocessable(rejection.body_text()))
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Response> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| unprocessable(rejection.body_text()))
}

/// `GET /podcasts/search?q=`
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Response {
    let params = match query(params) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let q = match params.q {
        Some(q) if !q.is_empty() => q,
        _ => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "query parameter 'q' must not be empty",
            )
        }
    };

    match state.podcasts.search(&q).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /podcasts/{podcast_id}`
pub async fn get_podcast(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let podcast_id = match path_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.podcasts.get_podcast(podcast_id).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /podcasts/{podcast_id}/episodes?max=`
pub async fn get_episodes(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    params: Result<Query<EpisodesQuery>, QueryRejection>,
) -> Response {
    let (podcast_id, params) = match (path_id(path), query(params)) {
        (Ok(id), Ok(params)) => (id, params),
        (Err(response), _) | (_, Err(response)) => return response,
    };

    let max = params.max.unwrap_or(DEFAULT_MAX_EPISODES);
    if max > MAX_EPISODES_LIMIT {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("query parameter 'max' must be at most {MAX_EPISODES_LIMIT}"),
        );
    }

    match state.podcasts.get_episodes(podcast_id, max).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /episodes/{episode_id}`
pub async fn get_episode(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let episode_id = match path_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.podcasts.get_episode(episode_id).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    }
}
