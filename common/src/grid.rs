//! 그리드 표시 행 생성
//!
//! 정렬・그룹화된 경로 검색 결과를 그리드가 그대로 그릴 수 있는 평면 행으로 바꾼다.
//! 그룹 첫 행이 아닌 행은 그룹 번호와 주요 역을 비워서 셀 병합처럼 보이게 한다.

use crate::grouping::{arrange, GroupNumbering, GroupingStrategy};
use crate::identity::{route_identity, SelectionSet};
use crate::station::main_stations;
use crate::types::{confirmed_label, Cell, RouteResult};
use serde::Serialize;

/// 주요 역 구분자
pub const STATION_SEPARATOR: &str = " → ";

/// 그리드 1행
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedRow {
    pub id: String,
    pub rn: i64,
    pub group_no: u32,
    /// 그룹 첫 행만 표시, 나머지는 null
    pub group_display: Cell<u32>,
    pub confirmed_path: String,
    pub confirmed_path_display: Cell<String>,
    /// 그룹 첫 행이 아니면 빈 문자열
    pub main_stations: String,
    /// 업스트림 원문 그대로 (중복 역 포함)
    pub path_nm: String,
    pub is_selected: bool,
    pub is_first_in_group: bool,
    pub is_first_confirmed_in_group: bool,
    pub cnt: i64,
    pub path_key: String,
}

/// 경로 검색 결과를 그리드 행으로 변환
///
/// # Arguments
/// * `results` - 업스트림 결과 (정렬 전 원본 순서)
/// * `selected` - 현재 선택된 경로들
/// * `strategy` - 그룹 키 방식
pub fn project_rows(
    results: &[RouteResult],
    selected: &[RouteResult],
    strategy: GroupingStrategy,
) -> Vec<GroupedRow> {
    if results.is_empty() {
        return Vec::new();
    }

    let numbering = GroupNumbering::assign(results, strategy);
    let selection = SelectionSet::new(selected);

    arrange(results, &numbering)
        .into_iter()
        .map(|placement| {
            let route = &results[placement.index];
            let main = if placement.is_first_in_group {
                main_stations(route).join(STATION_SEPARATOR)
            } else {
                String::new()
            };

            GroupedRow {
                id: route_identity(route),
                rn: route.rn.unwrap_or(0),
                group_no: placement.group_no,
                group_display: Cell::shown_if(placement.is_first_in_group, placement.group_no),
                confirmed_path: route.confirmed_path().to_string(),
                confirmed_path_display: Cell::shown_if(
                    placement.is_first_confirmed_in_group,
                    confirmed_label(route.confirmed_path()),
                ),
                main_stations: main,
                path_nm: route.path_nm.clone().unwrap_or_default(),
                is_selected: selection.contains(route),
                is_first_in_group: placement.is_first_in_group,
                is_first_confirmed_in_group: placement.is_first_confirmed_in_group,
                cnt: route.cnt.unwrap_or(0),
                path_key: route.path_key.clone().unwrap_or_default(),
            }
        })
        .collect()
}

/// 그룹 요약 (CLI 출력용)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group_no: u32,
    pub main_stations: String,
    pub row_count: usize,
    pub total_cnt: i64,
    pub selected_count: usize,
}

/// 그리드 행을 그룹 단위로 요약
pub fn summarize_groups(rows: &[GroupedRow]) -> Vec<GroupSummary> {
    let mut summaries: Vec<GroupSummary> = Vec::new();

    for row in rows {
        match summaries.last_mut() {
            Some(current) if current.group_no == row.group_no => {
                current.row_count += 1;
                current.total_cnt = current.total_cnt.saturating_add(row.cnt);
                current.selected_count += usize::from(row.is_selected);
            }
            _ => summaries.push(GroupSummary {
                group_no: row.group_no,
                main_stations: row.main_stations.clone(),
                row_count: 1,
                total_cnt: row.cnt,
                selected_count: usize::from(row.is_selected),
            }),
        }
    }

    summaries
}
