//! 업스트림(.do) 응답 정규화
//!
//! 레거시 백엔드는 같은 엔드포인트에서도 배열, `{options: [...]}`, HTML 에러 페이지를
//! 섞어서 돌려준다. 응답 본문을 분류해서 호출하는 쪽이 한 가지 모양만 다루게 한다.

use crate::error::{Error, Result};
use crate::types::RouteResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

lazy_static::lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
}

/// 행 배열을 감싸서 보내는 경우의 키
const WRAPPED_ROW_KEYS: [&str; 3] = ["list", "data", "rows"];

/// 선택 목록 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    /// 문자열, 숫자, 또는 `value|code|cd` / `label|name|nm` 키를 가진 객체에서 생성
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self {
                value: s.clone(),
                label: s.clone(),
            }),
            Value::Number(n) => Some(Self {
                value: n.to_string(),
                label: n.to_string(),
            }),
            Value::Object(object) => {
                let value = pick_text(object, &["value", "code", "cd"])?;
                let label = pick_text(object, &["label", "name", "nm"]).unwrap_or_else(|| value.clone());
                Some(Self { value, label })
            }
            _ => None,
        }
    }
}

fn pick_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| object.get(*k).and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 분류된 업스트림 응답
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    Empty,
    Rows(Vec<Value>),
    Options(Vec<SelectOption>),
    /// HTML 에러 페이지 (세션 만료, 서버 오류 등)
    ErrorPage { title: String },
    Invalid { reason: String },
}

/// 응답 본문을 분류
pub fn normalize(body: &str) -> UpstreamPayload {
    let trimmed = body.trim_start_matches('\u{feff}').trim();

    if trimmed.is_empty() {
        return UpstreamPayload::Empty;
    }
    if trimmed.starts_with('<') {
        let title = TITLE_RE
            .captures(trimmed)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_default();
        return UpstreamPayload::ErrorPage { title };
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(rows)) => UpstreamPayload::Rows(rows),
        Ok(Value::Object(mut object)) => {
            if let Some(Value::Array(options)) = object.get("options") {
                return UpstreamPayload::Options(
                    options.iter().filter_map(SelectOption::from_value).collect(),
                );
            }
            for key in WRAPPED_ROW_KEYS {
                if matches!(object.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(rows)) = object.remove(key) {
                        return UpstreamPayload::Rows(rows);
                    }
                }
            }
            UpstreamPayload::Rows(vec![Value::Object(object)])
        }
        Ok(other) => UpstreamPayload::Invalid {
            reason: format!("예상하지 못한 JSON 값: {}", other),
        },
        Err(e) => UpstreamPayload::Invalid {
            reason: e.to_string(),
        },
    }
}

impl UpstreamPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamPayload::Empty => "empty",
            UpstreamPayload::Rows(_) => "rows",
            UpstreamPayload::Options(_) => "options",
            UpstreamPayload::ErrorPage { .. } => "error-page",
            UpstreamPayload::Invalid { .. } => "invalid",
        }
    }

    /// 행 목록으로 변환 (행이 아니면 에러)
    pub fn try_into_rows(self) -> Result<Vec<Value>> {
        match self {
            UpstreamPayload::Empty => Ok(Vec::new()),
            UpstreamPayload::Rows(rows) => Ok(rows),
            UpstreamPayload::Options(options) => Ok(options
                .into_iter()
                .map(|o| serde_json::json!({ "value": o.value, "label": o.label }))
                .collect()),
            UpstreamPayload::ErrorPage { title } => {
                Err(Error::Parse(format!("업스트림 에러 페이지: {}", title)))
            }
            UpstreamPayload::Invalid { reason } => Err(Error::Parse(reason)),
        }
    }

    /// 행 목록으로 변환 (행이 아니면 경고 후 빈 목록)
    pub fn into_rows(self) -> Vec<Value> {
        let kind = self.kind();
        self.try_into_rows().unwrap_or_else(|e| {
            warn!(payload = kind, error = %e, "업스트림 응답을 빈 목록으로 처리");
            Vec::new()
        })
    }

    /// 선택 목록으로 변환
    pub fn into_options(self) -> Vec<SelectOption> {
        match self {
            UpstreamPayload::Options(options) => options,
            UpstreamPayload::Rows(rows) => rows.iter().filter_map(SelectOption::from_value).collect(),
            other => {
                if !matches!(other, UpstreamPayload::Empty) {
                    warn!(payload = other.kind(), "선택 목록이 아닌 업스트림 응답");
                }
                Vec::new()
            }
        }
    }

    /// 경로 검색 결과로 변환 (역직렬화 실패 행은 건너뜀)
    pub fn into_route_results(self) -> Vec<RouteResult> {
        route_results_from_rows(self.into_rows())
    }
}

/// 행 목록을 경로 검색 결과로 역직렬화
pub fn route_results_from_rows(rows: Vec<Value>) -> Vec<RouteResult> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| match serde_json::from_value::<RouteResult>(row) {
            Ok(route) => Some(route),
            Err(e) => {
                warn!(row = i, error = %e, "경로 검색 결과 행을 건너뜀");
                None
            }
        })
        .collect()
}
