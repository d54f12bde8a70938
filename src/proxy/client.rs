//! 업스트림(.do) 호출
//!
//! 브라우저 요청의 메서드, 쿼리, 본문, Content-Type 을 그대로 넘기고
//! 세션 쿠키만 업스트림 JSESSIONID 로 바꿔 끼운다.

use super::session::{set_cookie_value, upstream_cookie, UPSTREAM_SESSION_COOKIE};
use crate::error::{FareRouteError, Result};
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;

lazy_static::lazy_static! {
    static ref ENDPOINT_RE: Regex = Regex::new(r"^([A-Za-z0-9_-]+/)*[A-Za-z0-9_-]+\.do$").unwrap();
}

/// 전달할 요청
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// 검증된 상대 경로 (예: `route/searchPath.do`)
    pub endpoint: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub jsessionid: Option<String>,
}

/// 업스트림 응답
#[derive(Debug, Clone)]
pub struct UpstreamReply<B> {
    pub status: StatusCode,
    pub content_type: Option<String>,
    /// 업스트림이 새로 내려준 JSESSIONID
    pub jsessionid: Option<String>,
    pub body: B,
}

/// 엔드포인트 검증
///
/// 영문・숫자・`_`・`-` 로 된 경로 조각이 `/` 로 이어지고 `.do` 로 끝나야 한다.
pub fn validate_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim_start_matches('/');
    if ENDPOINT_RE.is_match(endpoint) {
        Ok(endpoint.to_string())
    } else {
        Err(FareRouteError::InvalidEndpoint(endpoint.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &str, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}/{}?{}", self.base_url, endpoint, q),
            None => format!("{}/{}", self.base_url, endpoint),
        }
    }

    async fn send(&self, request: ForwardRequest) -> Result<reqwest::Response> {
        let url = self.url_for(&request.endpoint, request.query.as_deref());
        debug!(method = %request.method, url = %url, session = request.jsessionid.is_some(), "업스트림 요청");

        let mut builder = self.http.request(request.method, url);
        if let Some(jsessionid) = &request.jsessionid {
            builder = builder.header(COOKIE, upstream_cookie(jsessionid));
        }
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        Ok(builder.send().await?)
    }

    fn reply_parts(response: &reqwest::Response) -> (StatusCode, Option<String>, Option<String>) {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let jsessionid = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| set_cookie_value(v, UPSTREAM_SESSION_COOKIE));
        (response.status(), content_type, jsessionid)
    }

    /// 본문을 바이트 그대로 받는다
    pub async fn forward_bytes(&self, request: ForwardRequest) -> Result<UpstreamReply<Vec<u8>>> {
        let response = self.send(request).await?;
        let (status, content_type, jsessionid) = Self::reply_parts(&response);
        let body = response.bytes().await?.to_vec();
        Ok(UpstreamReply { status, content_type, jsessionid, body })
    }

    /// 본문을 Content-Type 의 charset 에 맞춰 문자열로 받는다 (EUC-KR 응답 포함)
    pub async fn forward_text(&self, request: ForwardRequest) -> Result<UpstreamReply<String>> {
        let response = self.send(request).await?;
        let (status, content_type, jsessionid) = Self::reply_parts(&response);
        let body = response.text().await?;
        Ok(UpstreamReply { status, content_type, jsessionid, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_endpoint() {
        assert_eq!(validate_endpoint("route/searchPath.do").unwrap(), "route/searchPath.do");
        assert_eq!(validate_endpoint("/stl/list.do").unwrap(), "stl/list.do");
        assert_eq!(validate_endpoint("login.do").unwrap(), "login.do");
    }

    #[test]
    fn test_validate_endpoint_rejects() {
        for bad in [
            "../etc/passwd.do",
            "route/../admin.do",
            "http://evil.example/x.do",
            "route/search.jsp",
            "route//x.do",
            "",
            ".do",
        ] {
            assert!(
                matches!(validate_endpoint(bad), Err(FareRouteError::InvalidEndpoint(_))),
                "거부되어야 함: {}",
                bad
            );
        }
    }

    #[test]
    fn test_url_for() {
        let client = UpstreamClient::new("http://legacy:8080/fare/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://legacy:8080/fare");
        assert_eq!(client.url_for("a/b.do", None), "http://legacy:8080/fare/a/b.do");
        assert_eq!(client.url_for("a/b.do", Some("")), "http://legacy:8080/fare/a/b.do");
        assert_eq!(client.url_for("a/b.do", Some("x=1&y=2")), "http://legacy:8080/fare/a/b.do?x=1&y=2");
    }
}
