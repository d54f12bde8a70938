//! 프록시 HTTP 서버 (axum)

use super::client::{validate_endpoint, ForwardRequest, UpstreamClient, UpstreamReply};
use super::session::{
    cookie_value, expired_ext_sid_cookie, ext_sid_cookie, SessionStore, EXT_SID_COOKIE,
};
use crate::error::{FareRouteError, Result};
use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use fare_route_common::upstream::route_results_from_rows;
use fare_route_common::{normalize, project_rows, GroupedRow, GroupingStrategy, UpstreamPayload};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<UpstreamClient>,
    pub sessions: SessionStore,
    pub default_strategy: GroupingStrategy,
}

impl AppState {
    pub fn new(client: UpstreamClient, sessions: SessionStore, default_strategy: GroupingStrategy) -> Self {
        Self {
            client: Arc::new(client),
            sessions,
            default_strategy,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/do/{*endpoint}", any(passthrough))
        .route("/api/rows/{*endpoint}", any(rows))
        .route("/api/options/{*endpoint}", any(options))
        .route("/api/route-grid", post(route_grid))
        .route("/api/logout", post(logout))
        .with_state(state)
}

/// 리스너에서 서버 실행 (Ctrl-C 로 종료)
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    let sessions = state.sessions.clone();
    let purge = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                info!(purged, remaining = sessions.len(), "만료 세션 정리");
            }
        }
    });

    let router = build_router(state);
    let result = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    purge.abort();
    result.map_err(FareRouteError::from)
}

fn error_status(err: &FareRouteError) -> StatusCode {
    match err {
        FareRouteError::InvalidEndpoint(_) => StatusCode::BAD_REQUEST,
        FareRouteError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        FareRouteError::Upstream(_)
        | FareRouteError::UpstreamErrorPage(_)
        | FareRouteError::Common(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for FareRouteError {
    fn into_response(self) -> Response {
        let status = error_status(&self);
        warn!(status = %status, error = %self, "프록시 요청 실패");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// 프록시 요청 공통 부분
struct ForwardParts {
    endpoint: String,
    method: Method,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

/// 세션 변환 준비: (업스트림 요청, 대응표에 살아 있는 ext_sid)
fn prepare(state: &AppState, parts: ForwardParts) -> Result<(ForwardRequest, Option<String>)> {
    let endpoint = validate_endpoint(&parts.endpoint)?;

    let client_sid = parts
        .headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| cookie_value(header, EXT_SID_COOKIE));
    let jsessionid = client_sid.as_deref().and_then(|sid| state.sessions.resolve(sid));
    let live_sid = client_sid.filter(|_| jsessionid.is_some());

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let request = ForwardRequest {
        method: parts.method,
        endpoint,
        query: parts.query,
        content_type,
        body: parts.body.to_vec(),
        jsessionid,
    };
    Ok((request, live_sid))
}

/// 업스트림이 JSESSIONID 를 내려줬으면 연결하고, 브라우저에 줄 Set-Cookie 를 만든다
fn settle_session<B>(
    state: &AppState,
    live_sid: Option<String>,
    reply: &UpstreamReply<B>,
) -> Option<HeaderValue> {
    let jsessionid = reply.jsessionid.as_deref()?;
    let sid = state.sessions.bind(live_sid.as_deref(), jsessionid);
    if live_sid.as_deref() == Some(sid.as_str()) {
        return None;
    }
    info!(sessions = state.sessions.len(), "새 ext_sid 발급");
    HeaderValue::from_str(&ext_sid_cookie(&sid)).ok()
}

fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

async fn forward_text(
    state: &AppState,
    parts: ForwardParts,
) -> Result<(UpstreamReply<String>, Option<HeaderValue>)> {
    let (request, live_sid) = prepare(state, parts)?;
    let endpoint = request.endpoint.clone();
    let reply = state.client.forward_text(request).await?;
    info!(endpoint = %endpoint, status = %reply.status, "업스트림 응답");
    let cookie = settle_session(state, live_sid, &reply);
    Ok((reply, cookie))
}

/// 정규화할 본문 (에러 페이지나 2xx 가 아닌 응답은 에러)
fn successful_payload(reply: &UpstreamReply<String>) -> Result<UpstreamPayload> {
    match normalize(&reply.body) {
        UpstreamPayload::ErrorPage { title } => Err(FareRouteError::UpstreamErrorPage(title)),
        _ if !reply.status.is_success() => {
            Err(FareRouteError::Upstream(format!("업스트림 응답 상태 {}", reply.status)))
        }
        payload => Ok(payload),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// `.do` 응답을 그대로 전달 (상태, Content-Type, 본문)
async fn passthrough(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let parts = ForwardParts { endpoint, method, query, headers, body };
    let (request, live_sid) = prepare(&state, parts)?;
    let endpoint = request.endpoint.clone();
    let reply = state.client.forward_bytes(request).await?;
    info!(endpoint = %endpoint, status = %reply.status, bytes = reply.body.len(), "업스트림 응답");

    let cookie = settle_session(&state, live_sid, &reply);
    let mut response = (reply.status, reply.body).into_response();
    if let Some(content_type) = reply.content_type.as_deref().and_then(|v| HeaderValue::from_str(v).ok()) {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Ok(with_cookie(response, cookie))
}

/// 응답을 항상 JSON 배열로
async fn rows(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let parts = ForwardParts { endpoint, method, query, headers, body };
    let (reply, cookie) = forward_text(&state, parts).await?;

    let rows = successful_payload(&reply)?.try_into_rows()?;
    Ok(with_cookie(Json(rows).into_response(), cookie))
}

/// 응답을 항상 `{options: [...]}` 로
async fn options(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let parts = ForwardParts { endpoint, method, query, headers, body };
    let (reply, cookie) = forward_text(&state, parts).await?;

    let options = successful_payload(&reply)?.into_options();
    Ok(with_cookie(Json(json!({ "options": options })).into_response(), cookie))
}

/// `/api/route-grid` 요청 본문
///
/// 행은 원본 JSON 으로 받아서 하나씩 해석한다. 깨진 행은 건너뛰고 `null` 은 빈 목록.
#[derive(Debug, Deserialize)]
pub struct RouteGridRequest {
    #[serde(default)]
    pub results: Option<Vec<Value>>,
    #[serde(default)]
    pub selected: Option<Vec<Value>>,
    pub strategy: Option<GroupingStrategy>,
}

async fn route_grid(
    State(state): State<AppState>,
    Json(request): Json<RouteGridRequest>,
) -> Json<Vec<GroupedRow>> {
    let strategy = request.strategy.unwrap_or(state.default_strategy);
    let results = route_results_from_rows(request.results.unwrap_or_default());
    let selected = route_results_from_rows(request.selected.unwrap_or_default());
    Json(project_rows(&results, &selected, strategy))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let sid = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| cookie_value(header, EXT_SID_COOKIE));
    if let Some(sid) = sid {
        if state.sessions.remove(&sid) {
            info!(sessions = state.sessions.len(), "세션 종료");
        }
    }

    let cookie = HeaderValue::from_str(&expired_ext_sid_cookie()).ok();
    with_cookie(StatusCode::NO_CONTENT.into_response(), cookie)
}
