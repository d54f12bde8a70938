//! 저장된 업스트림 응답 파일 읽기
//!
//! 파일 내용은 업스트림 본문 그대로여도 된다 (배열, `{list: [...]}`, HTML 에러 페이지 등).

use crate::error::{FareRouteError, Result};
use fare_route_common::upstream::{normalize, route_results_from_rows, UpstreamPayload};
use fare_route_common::RouteResult;
use serde_json::Value;
use std::path::Path;

pub fn read_payload(path: &Path) -> Result<UpstreamPayload> {
    if !path.exists() {
        return Err(FareRouteError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(normalize(&content))
}

/// 행 목록 읽기 (에러 페이지나 해석 불가 본문은 에러)
pub fn read_rows(path: &Path) -> Result<Vec<Value>> {
    match read_payload(path)? {
        UpstreamPayload::ErrorPage { title } => Err(FareRouteError::UpstreamErrorPage(title)),
        payload => Ok(payload.try_into_rows()?),
    }
}

pub fn read_route_results(path: &Path) -> Result<Vec<RouteResult>> {
    Ok(route_results_from_rows(read_rows(path)?))
}

/// 선택 경로 파일 (없으면 빈 선택)
pub fn read_selection(path: Option<&Path>) -> Result<Vec<RouteResult>> {
    match path {
        Some(path) => read_route_results(path),
        None => Ok(Vec::new()),
    }
}
