//! 역명 추출
//!
//! 업스트림은 역을 `(노선정보)노선코드_역명(역코드)` 형태의 문자열로 보낸다.
//! - 역 문자열 파싱 (실패 시 원문 유지)
//! - 환승역 목록(JSON 배열 문자열) 파싱
//! - 출발 → 환승 → 도착 주요 역 목록 (연속 중복 제거)

use crate::types::RouteResult;
use regex::Regex;
use tracing::warn;

lazy_static::lazy_static! {
    static ref STATION_RE: Regex =
        Regex::new(r"\(([^)]*)\)([^_]*)_([^(]*)(?:\(([^)]*)\))?").unwrap();
}

/// 파싱된 역 문자열
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStation {
    pub line_info: String,
    pub line_code: String,
    pub name: String,
    pub station_code: Option<String>,
}

/// 역 문자열 파싱 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationRef {
    Parsed(ParsedStation),
    /// 형식이 맞지 않는 원문
    Unparsed(String),
}

impl StationRef {
    /// 표시용 역명 (파싱 실패 시 원문)
    pub fn name(&self) -> &str {
        match self {
            StationRef::Parsed(p) => &p.name,
            StationRef::Unparsed(raw) => raw,
        }
    }
}

/// 역 문자열을 파싱
///
/// # Examples
/// ```
/// use fare_route_common::station::parse_station;
///
/// assert_eq!(parse_station("(1)1_A역(100)").name(), "A역");
/// assert_eq!(parse_station("A역").name(), "A역");
/// ```
pub fn parse_station(raw: &str) -> StationRef {
    match STATION_RE.captures(raw) {
        Some(caps) => StationRef::Parsed(ParsedStation {
            line_info: caps[1].to_string(),
            line_code: caps[2].to_string(),
            name: caps[3].to_string(),
            station_code: caps.get(4).map(|m| m.as_str().to_string()),
        }),
        None => StationRef::Unparsed(raw.to_string()),
    }
}

/// 역 문자열에서 역명만 추출
pub fn station_name(raw: &str) -> String {
    parse_station(raw).name().to_string()
}

/// 환승역 목록 파싱
///
/// JSON 배열 문자열이 아니면 경고만 남기고 빈 목록을 돌려준다.
pub fn parse_transfer_list(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(transfer_list = raw, error = %e, "환승역 목록 파싱 실패, 빈 목록으로 처리");
            Vec::new()
        }
    }
}

/// 바로 앞 값과 같은 항목을 제거 (떨어져 있는 중복은 유지)
pub fn collapse_consecutive(names: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if result.last() != Some(&name) {
            result.push(name);
        }
    }
    result
}

/// 출발역 → 환승역 → 도착역 순의 주요 역명 목록
pub fn main_stations(route: &RouteResult) -> Vec<String> {
    let mut names = Vec::new();

    if let Some(start) = route.start_node.as_deref().filter(|s| !s.is_empty()) {
        names.push(station_name(start));
    }
    for transfer in parse_transfer_list(route.transfer_list.as_deref()) {
        names.push(station_name(&transfer));
    }
    if let Some(end) = route.end_node.as_deref().filter(|s| !s.is_empty()) {
        names.push(station_name(end));
    }

    collapse_consecutive(names)
}

/// 상세 경로(`path_nm`)를 경유역 목록으로 분리
pub fn path_waypoints(path_nm: &str) -> Vec<String> {
    path_nm
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_station_full() {
        let parsed = parse_station("(2)2_강남역(222)");
        assert_eq!(
            parsed,
            StationRef::Parsed(ParsedStation {
                line_info: "2".into(),
                line_code: "2".into(),
                name: "강남역".into(),
                station_code: Some("222".into()),
            })
        );
    }

    #[test]
    fn test_parse_station_without_code() {
        let parsed = parse_station("(경의중앙)K_서울역");
        assert_eq!(parsed.name(), "서울역");
        if let StationRef::Parsed(p) = parsed {
            assert_eq!(p.station_code, None);
            assert_eq!(p.line_code, "K");
        } else {
            panic!("Parsed 를 기대함");
        }
    }

    #[test]
    fn test_parse_station_fallback() {
        assert_eq!(parse_station("그냥역"), StationRef::Unparsed("그냥역".into()));
        assert_eq!(station_name(""), "");
    }

    #[test]
    fn test_parse_transfer_list() {
        let list = parse_transfer_list(Some(r#"["(1)1_B역(200)","(2)2_C역(300)"]"#));
        assert_eq!(list.len(), 2);
        assert!(parse_transfer_list(Some("[]")).is_empty());
        assert!(parse_transfer_list(None).is_empty());
        assert!(parse_transfer_list(Some("  ")).is_empty());
    }

    #[test]
    fn test_parse_transfer_list_malformed() {
        assert!(parse_transfer_list(Some("not json")).is_empty());
        assert!(parse_transfer_list(Some(r#"{"a":1}"#)).is_empty());
    }

    #[test]
    fn test_collapse_consecutive() {
        assert_eq!(
            collapse_consecutive(strings(&["A", "A", "B", "B", "C"])),
            strings(&["A", "B", "C"])
        );
        assert_eq!(
            collapse_consecutive(strings(&["A", "B", "A"])),
            strings(&["A", "B", "A"])
        );
        assert!(collapse_consecutive(Vec::new()).is_empty());
    }

    #[test]
    fn test_main_stations() {
        let route = RouteResult {
            start_node: Some("(1)1_A역(100)".into()),
            end_node: Some("(1)1_C역(300)".into()),
            transfer_list: Some(r#"["(1)1_B역(200)"]"#.into()),
            ..Default::default()
        };
        assert_eq!(main_stations(&route), strings(&["A역", "B역", "C역"]));
    }

    #[test]
    fn test_main_stations_collapses_repeated_transfer() {
        let route = RouteResult {
            start_node: Some("(1)1_A역(100)".into()),
            end_node: Some("(2)2_B역(201)".into()),
            transfer_list: Some(r#"["(1)1_B역(200)"]"#.into()),
            ..Default::default()
        };
        assert_eq!(main_stations(&route), strings(&["A역", "B역"]));
    }

    #[test]
    fn test_main_stations_malformed_transfer() {
        let route = RouteResult {
            start_node: Some("(1)1_A역(100)".into()),
            end_node: Some("(1)1_C역(300)".into()),
            transfer_list: Some("not json".into()),
            ..Default::default()
        };
        assert_eq!(main_stations(&route), strings(&["A역", "C역"]));
    }

    #[test]
    fn test_path_waypoints() {
        assert_eq!(path_waypoints("A, B,,C "), strings(&["A", "B", "C"]));
        assert!(path_waypoints("").is_empty());
    }
}
