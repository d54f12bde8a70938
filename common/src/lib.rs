//! Fare Route Common Library
//!
//! CLI 와 프록시 서버가 함께 쓰는 경로 검색 결과 가공 로직.
//! I/O 없이 이미 받아 온 배열만 다룬다.

pub mod types;
pub mod error;
pub mod identity;
pub mod station;
pub mod grouping;
pub mod grid;
pub mod columns;
pub mod upstream;
pub mod export;

pub use types::{Cell, RawId, RouteResult};
pub use error::{Error, Result};
pub use identity::{is_same_route, route_identity, SelectionSet};
pub use station::{main_stations, parse_station, StationRef};
pub use grouping::{GroupNumbering, GroupingStrategy};
pub use grid::{project_rows, summarize_groups, GroupSummary, GroupedRow};
pub use columns::{plan_columns, side_totals, ColumnPlan};
pub use upstream::{normalize, SelectOption, UpstreamPayload};
