//! 세션 변환 프록시
//!
//! 레거시 백엔드의 `.do` 엔드포인트를 감싸서
//! - `ext_sid` ↔ `JSESSIONID` 쿠키 변환
//! - 들쭉날쭉한 응답(배열 / options / HTML 에러 페이지) 정규화
//! - 경로 검색 결과의 그리드 행 변환
//! 을 제공한다.

pub mod client;
pub mod server;
pub mod session;

pub use client::UpstreamClient;
pub use server::{build_router, serve_on, AppState};
pub use session::SessionStore;

use crate::config::Config;
use crate::error::Result;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// 설정과 CLI 인자로 프록시 서버 실행
pub async fn serve(config: &Config, bind: Option<String>, upstream: Option<String>) -> Result<()> {
    let upstream = match upstream {
        Some(url) => crate::config::normalize_base_url(&url)?,
        None => config.upstream_url()?,
    };
    let bind = bind.unwrap_or_else(|| config.bind_addr.clone());

    let client = UpstreamClient::new(&upstream, Duration::from_secs(config.timeout_seconds))?;
    let sessions = SessionStore::new(config.session_ttl());
    let state = AppState::new(client, sessions, config.default_strategy);

    let listener = TcpListener::bind(&bind).await?;
    info!(bind = %bind, upstream = %upstream, "프록시 서버 시작");
    println!("✔ {} → {}", bind, upstream);

    serve_on(listener, state).await
}
