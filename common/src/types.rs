//! 경로 검색 결과 타입 정의
//!
//! 업스트림(.do) 응답을 그대로 받는 타입과 그리드 표시용 보조 타입:
//! - RouteResult: 업스트림 경로 검색 결과 1행
//! - RawId: 숫자/문자열 어느 쪽으로도 오는 `id`
//! - Cell: 셀 병합 흉내용 표시값 (표시 / 숨김)

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// 업스트림 경로 검색 결과
///
/// 업스트림은 숫자 필드를 문자열로 보내기도 하므로 숫자 필드는 관대하게 읽는다.
/// 숫자로 해석할 수 없는 값은 없는 값으로 취급한다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteResult {
    /// 출발역 (`(노선정보)노선코드_역명(역코드)`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_node: Option<String>,

    /// 도착역
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_node: Option<String>,

    /// 환승역 목록 (JSON 배열 문자열, 또는 "[]")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_list: Option<String>,

    /// 상세 경로 (쉼표 구분)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_nm: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_key: Option<String>,

    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub path_seq: Option<i64>,

    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub group_no: Option<i64>,

    /// 확정 경로 여부 ("Y" / "N")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_path: Option<String>,

    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub cnt: Option<i64>,

    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub rn: Option<i64>,

    #[serde(deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RawId>,
}

impl RouteResult {
    /// 비어 있지 않은 path_key
    pub fn path_key(&self) -> Option<&str> {
        self.path_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn confirmed_path(&self) -> &str {
        self.confirmed_path.as_deref().unwrap_or("")
    }
}

/// 업스트림 `id` 필드
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    /// 0 이 아닌 숫자, 또는 빈 문자열이 아닌 문자열이면 참
    pub fn is_truthy(&self) -> bool {
        match self {
            RawId::Number(n) => *n != 0,
            RawId::Text(s) => !s.is_empty(),
        }
    }
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// 행 병합을 흉내 내기 위한 표시값
///
/// 그룹 첫 행만 값을 보이고 나머지 행은 숨긴다.
/// 직렬화 시 `Suppressed` 는 `null` 이 된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<T> {
    Shown(T),
    Suppressed,
}

impl<T> Cell<T> {
    pub fn shown_if(shown: bool, value: T) -> Self {
        if shown {
            Cell::Shown(value)
        } else {
            Cell::Suppressed
        }
    }

    pub fn as_shown(&self) -> Option<&T> {
        match self {
            Cell::Shown(v) => Some(v),
            Cell::Suppressed => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Cell::Suppressed)
    }
}

impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Shown(v) => v.serialize(serializer),
            Cell::Suppressed => serializer.serialize_none(),
        }
    }
}

/// 확정 경로 플래그의 표시 문자열
pub fn confirmed_label(raw: &str) -> String {
    match raw {
        "Y" => "확정".to_string(),
        "N" => "미확정".to_string(),
        other => other.to_string(),
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_i64))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RawId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => Some(match n.as_i64() {
            Some(i) => RawId::Number(i),
            None => RawId::Text(n.to_string()),
        }),
        Some(Value::String(s)) => Some(RawId::Text(s)),
        _ => None,
    })
}

/// JSON 값을 정수로 해석 (숫자 또는 숫자 문자열)
pub(crate) fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
