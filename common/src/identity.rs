//! 경로 식별자
//!
//! 경로 검색 결과의 안정적인 식별 문자열을 만들고,
//! 선택된 경로 집합과의 일치 여부를 판정한다.

use crate::types::{RawId, RouteResult};
use std::collections::HashSet;

/// 경로 식별 문자열
///
/// 우선순위:
/// 1. `path_key` 와 `path_seq` 가 모두 있으면 `{path_key}_{path_seq}` (`path_seq == 0` 포함)
/// 2. `path_key` 만 있으면 `path_key`
/// 3. `id` 가 참 값이면 `id`
/// 4. 빈 문자열 (식별 불가)
pub fn route_identity(route: &RouteResult) -> String {
    match (route.path_key(), route.path_seq) {
        (Some(key), Some(seq)) => format!("{}_{}", key, seq),
        (Some(key), None) => key.to_string(),
        (None, _) => route
            .id
            .as_ref()
            .filter(|id| id.is_truthy())
            .map(|id| id.to_string())
            .unwrap_or_default(),
    }
}

/// 두 결과가 같은 경로인지
///
/// 식별 문자열이 같고 비어 있지 않거나, 원본 `id` 가 같고 참 값이면 같은 경로.
/// 둘 다 식별 불가면 같은 경로로 보지 않는다.
pub fn is_same_route(a: &RouteResult, b: &RouteResult) -> bool {
    let ia = route_identity(a);
    if !ia.is_empty() && ia == route_identity(b) {
        return true;
    }
    match (&a.id, &b.id) {
        (Some(x), Some(y)) => x.is_truthy() && x == y,
        _ => false,
    }
}

/// 선택된 경로 집합
///
/// 행마다 선택 목록 전체를 훑지 않도록 식별 문자열과 원본 id 를 미리 모아 둔다.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    identities: HashSet<String>,
    ids: HashSet<RawId>,
}

impl SelectionSet {
    pub fn new(selected: &[RouteResult]) -> Self {
        let mut set = Self::default();
        for route in selected {
            let identity = route_identity(route);
            if !identity.is_empty() {
                set.identities.insert(identity);
            }
            if let Some(id) = route.id.as_ref().filter(|id| id.is_truthy()) {
                set.ids.insert(id.clone());
            }
        }
        set
    }

    pub fn contains(&self, route: &RouteResult) -> bool {
        let identity = route_identity(route);
        if !identity.is_empty() && self.identities.contains(&identity) {
            return true;
        }
        route
            .id
            .as_ref()
            .is_some_and(|id| id.is_truthy() && self.ids.contains(id))
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty() && self.ids.is_empty()
    }
}
