//! 그룹 번호 부여와 표시 순서 결정
//!
//! ## 처리 흐름
//! 1. 원본(정렬 전) 순서대로 그룹 키를 훑으며 처음 나온 순서로 1, 2, 3… 번호 부여
//! 2. 부여된 번호 오름차순으로 안정 정렬
//! 3. 그룹 첫 행 / 확정 여부 블록 첫 행 플래그 계산
//!
//! 번호 부여(`GroupNumbering::assign`)와 정렬(`arrange`)은 서로 독립된 단계다.

use crate::types::RouteResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// 그룹 키를 만드는 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingStrategy {
    /// `{group_no}_{transfer_list}`: 같은 group_no 라도 환승역이 다르면 다른 그룹
    #[default]
    TransferSet,
    /// `path_key` 만으로 묶음 (경로 상세 화면)
    PathKey,
}

impl GroupingStrategy {
    pub fn group_key(&self, route: &RouteResult) -> String {
        match self {
            GroupingStrategy::TransferSet => format!(
                "{}_{}",
                route.group_no.unwrap_or(0),
                route.transfer_list.as_deref().unwrap_or("")
            ),
            GroupingStrategy::PathKey => route.path_key.clone().unwrap_or_default(),
        }
    }
}

impl std::str::FromStr for GroupingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transfer-set" | "transfer" | "group" => Ok(GroupingStrategy::TransferSet),
            "path-key" | "path" => Ok(GroupingStrategy::PathKey),
            _ => Err(format!("Unknown strategy: {}. Use transfer-set or path-key", s)),
        }
    }
}

impl std::fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupingStrategy::TransferSet => write!(f, "transfer-set"),
            GroupingStrategy::PathKey => write!(f, "path-key"),
        }
    }
}

/// 그룹 키 → 그룹 번호 대응 (생성 후 불변)
#[derive(Debug, Clone, Default)]
pub struct GroupNumbering {
    by_key: HashMap<String, u32>,
    /// 입력 행별 그룹 번호 (입력 순서)
    row_groups: Vec<u32>,
}

impl GroupNumbering {
    /// 입력 순서대로 처음 나온 그룹 키에 1부터 번호를 붙인다
    pub fn assign(results: &[RouteResult], strategy: GroupingStrategy) -> Self {
        let mut by_key: HashMap<String, u32> = HashMap::new();
        let mut row_groups = Vec::with_capacity(results.len());

        for route in results {
            let key = strategy.group_key(route);
            let next = by_key.len() as u32 + 1;
            let number = *by_key.entry(key).or_insert(next);
            row_groups.push(number);
        }

        Self { by_key, row_groups }
    }

    pub fn group_of(&self, key: &str) -> Option<u32> {
        self.by_key.get(key).copied()
    }

    /// 입력 `index` 번째 행의 그룹 번호
    pub fn row_group(&self, index: usize) -> Option<u32> {
        self.row_groups.get(index).copied()
    }

    pub fn group_count(&self) -> usize {
        self.by_key.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_groups.len()
    }
}

/// 정렬된 표시 위치의 한 행
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// 원본 입력에서의 위치
    pub index: usize,
    pub group_no: u32,
    pub is_first_in_group: bool,
    /// 그룹 첫 행이거나 바로 앞 행과 확정 여부가 다름
    pub is_first_confirmed_in_group: bool,
}

/// 그룹 번호 오름차순으로 안정 정렬하고 플래그를 붙인다
///
/// `numbering` 에 번호가 없는 행(다른 배열로 만든 번호표)은 버리지 않고
/// 마지막 그룹 다음 번호로 묶어 맨 뒤에 둔다.
pub fn arrange(results: &[RouteResult], numbering: &GroupNumbering) -> Vec<Placement> {
    if numbering.row_count() != results.len() {
        warn!(
            rows = results.len(),
            numbered = numbering.row_count(),
            "그룹 번호표와 결과 행 수가 다름"
        );
    }
    let unnumbered = numbering.group_count() as u32 + 1;

    let mut order: Vec<(usize, u32)> = (0..results.len())
        .map(|index| (index, numbering.row_group(index).unwrap_or(unnumbered)))
        .collect();
    order.sort_by_key(|&(_, group_no)| group_no);

    let mut placements: Vec<Placement> = Vec::with_capacity(order.len());
    for (pos, &(index, group_no)) in order.iter().enumerate() {
        let prev = pos.checked_sub(1).map(|p| order[p]);
        let is_first_in_group = prev.map_or(true, |(_, prev_group)| prev_group != group_no);
        let is_first_confirmed_in_group = is_first_in_group
            || prev.is_some_and(|(prev_index, _)| {
                results[prev_index].confirmed_path() != results[index].confirmed_path()
            });

        placements.push(Placement {
            index,
            group_no,
            is_first_in_group,
            is_first_confirmed_in_group,
        });
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(group_no: Option<i64>, transfer: Option<&str>, confirmed: &str) -> RouteResult {
        RouteResult {
            group_no,
            transfer_list: transfer.map(str::to_string),
            confirmed_path: Some(confirmed.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_group_key_transfer_set() {
        let r = route(Some(1), Some("[]"), "Y");
        assert_eq!(GroupingStrategy::TransferSet.group_key(&r), "1_[]");
        assert_eq!(GroupingStrategy::TransferSet.group_key(&RouteResult::default()), "0_");
    }

    #[test]
    fn test_group_key_path_key() {
        let r = RouteResult {
            path_key: Some("K1".into()),
            group_no: Some(4),
            ..Default::default()
        };
        assert_eq!(GroupingStrategy::PathKey.group_key(&r), "K1");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("path-key".parse::<GroupingStrategy>(), Ok(GroupingStrategy::PathKey));
        assert_eq!("Transfer-Set".parse::<GroupingStrategy>(), Ok(GroupingStrategy::TransferSet));
        assert!("bogus".parse::<GroupingStrategy>().is_err());
    }

    #[test]
    fn test_same_group_no_different_transfers_split() {
        let results = vec![
            route(Some(1), Some("[]"), "Y"),
            route(Some(1), Some(r#"["(2)2_B역(200)"]"#), "Y"),
        ];
        let numbering = GroupNumbering::assign(&results, GroupingStrategy::TransferSet);
        assert_eq!(numbering.group_count(), 2);
        assert_ne!(numbering.row_group(0), numbering.row_group(1));
    }

    #[test]
    fn test_first_seen_numbering() {
        let results = vec![
            route(Some(5), Some("[]"), "Y"),
            route(Some(2), Some("[]"), "Y"),
            route(Some(5), Some("[]"), "N"),
        ];
        let numbering = GroupNumbering::assign(&results, GroupingStrategy::TransferSet);
        assert_eq!(numbering.group_of("5_[]"), Some(1));
        assert_eq!(numbering.group_of("2_[]"), Some(2));
        assert_eq!(numbering.row_group(2), Some(1));
        assert_eq!(numbering.row_count(), 3);
    }

    #[test]
    fn test_numbering_is_stable() {
        let results = vec![
            route(Some(3), Some("[]"), "Y"),
            route(Some(1), Some("[]"), "Y"),
            route(Some(3), Some("[]"), "Y"),
        ];
        let a = GroupNumbering::assign(&results, GroupingStrategy::TransferSet);
        let b = GroupNumbering::assign(&results, GroupingStrategy::TransferSet);
        assert_eq!(a.row_groups, b.row_groups);
    }

    #[test]
    fn test_arrange_sorts_and_keeps_ties() {
        let results = vec![
            route(Some(1), Some("[]"), "Y"),
            route(Some(2), Some("[]"), "Y"),
            route(Some(1), Some("[]"), "N"),
            route(Some(2), Some("[]"), "Y"),
        ];
        let numbering = GroupNumbering::assign(&results, GroupingStrategy::TransferSet);
        let placements = arrange(&results, &numbering);

        let indices: Vec<usize> = placements.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 2, 1, 3]);

        let firsts: Vec<bool> = placements.iter().map(|p| p.is_first_in_group).collect();
        assert_eq!(firsts, vec![true, false, true, false]);
    }

    #[test]
    fn test_one_first_row_per_group() {
        let results = vec![
            route(Some(2), Some("[]"), "Y"),
            route(Some(1), Some("[]"), "Y"),
            route(Some(2), Some("[]"), "Y"),
            route(Some(3), Some("[]"), "Y"),
            route(Some(1), Some("[]"), "Y"),
        ];
        let numbering = GroupNumbering::assign(&results, GroupingStrategy::TransferSet);
        let placements = arrange(&results, &numbering);

        let first_count = placements.iter().filter(|p| p.is_first_in_group).count();
        assert_eq!(first_count, numbering.group_count());
    }

    #[test]
    fn test_confirmed_sub_blocks() {
        let results = vec![
            route(Some(1), Some("[]"), "Y"),
            route(Some(1), Some("[]"), "Y"),
            route(Some(1), Some("[]"), "N"),
            route(Some(2), Some("[]"), "N"),
        ];
        let numbering = GroupNumbering::assign(&results, GroupingStrategy::TransferSet);
        let placements = arrange(&results, &numbering);

        let flags: Vec<bool> = placements.iter().map(|p| p.is_first_confirmed_in_group).collect();
        assert_eq!(flags, vec![true, false, true, true]);
    }

    #[test]
    fn test_arrange_keeps_rows_missing_from_numbering() {
        let results = vec![
            route(Some(1), Some("[]"), "Y"),
            route(Some(2), Some("[]"), "Y"),
            route(Some(1), Some("[]"), "N"),
        ];
        let numbering = GroupNumbering::assign(&results[..1], GroupingStrategy::TransferSet);
        let placements = arrange(&results, &numbering);

        assert_eq!(placements.len(), 3);
        let groups: Vec<(usize, u32)> = placements.iter().map(|p| (p.index, p.group_no)).collect();
        assert_eq!(groups, vec![(0, 1), (1, 2), (2, 2)]);
        assert!(placements[1].is_first_in_group);
        assert!(!placements[2].is_first_in_group);
    }

    #[test]
    fn test_arrange_empty() {
        let numbering = GroupNumbering::assign(&[], GroupingStrategy::TransferSet);
        assert!(arrange(&[], &numbering).is_empty());
    }
}
