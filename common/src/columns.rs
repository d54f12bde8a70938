//! 정산 데이터 컬럼 구성
//!
//! 정산 응답은 `{기관}_{노선}_{지급|수급}` 형태의 키로 값을 담아 온다.
//! 행 전체의 키를 훑어 고정 컬럼과 기관 → 노선 → 지급/수급 계층 컬럼으로 나눈다.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

lazy_static::lazy_static! {
    static ref SETTLEMENT_KEY_RE: Regex = Regex::new(r"^([^_]+)_([^_]+)_(지급|수급)$").unwrap();
}

/// 지급 / 수급 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Side {
    Pay,
    Receive,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::Pay => "지급",
            Side::Receive => "수급",
        }
    }
}

/// 정산 키 `{agency}_{line}_{side}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementKey {
    pub agency: String,
    pub line: String,
    pub side: Side,
}

impl SettlementKey {
    pub fn parse(key: &str) -> Option<Self> {
        let caps = SETTLEMENT_KEY_RE.captures(key)?;
        let side = match &caps[3] {
            "지급" => Side::Pay,
            _ => Side::Receive,
        };
        Some(Self {
            agency: caps[1].to_string(),
            line: caps[2].to_string(),
            side,
        })
    }

    pub fn field(&self) -> String {
        format!("{}_{}_{}", self.agency, self.line, self.side.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineColumns {
    pub line: String,
    /// 항상 지급 → 수급 순
    pub sides: Vec<Side>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgencyColumns {
    pub agency: String,
    pub lines: Vec<LineColumns>,
}

/// 컬럼 구성 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPlan {
    /// 패턴에 맞지 않는 키 (처음 나온 순서)
    pub fixed: Vec<String>,
    pub agencies: Vec<AgencyColumns>,
}

/// 헤더 트리 노드
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnNode {
    pub header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ColumnNode>,
}

impl ColumnNode {
    fn leaf(header: &str, field: String) -> Self {
        Self {
            header: header.to_string(),
            field: Some(field),
            children: Vec::new(),
        }
    }
}

impl ColumnPlan {
    fn add_key(&mut self, key: &str) {
        let Some(parsed) = SettlementKey::parse(key) else {
            if !self.fixed.iter().any(|f| f == key) {
                self.fixed.push(key.to_string());
            }
            return;
        };

        let agency = match self.agencies.iter().position(|a| a.agency == parsed.agency) {
            Some(i) => &mut self.agencies[i],
            None => {
                self.agencies.push(AgencyColumns {
                    agency: parsed.agency.clone(),
                    lines: Vec::new(),
                });
                let last = self.agencies.len() - 1;
                &mut self.agencies[last]
            }
        };

        let line = match agency.lines.iter().position(|l| l.line == parsed.line) {
            Some(i) => &mut agency.lines[i],
            None => {
                agency.lines.push(LineColumns {
                    line: parsed.line.clone(),
                    sides: Vec::new(),
                });
                let last = agency.lines.len() - 1;
                &mut agency.lines[last]
            }
        };

        if !line.sides.contains(&parsed.side) {
            line.sides.push(parsed.side);
            line.sides.sort();
        }
    }

    /// 헤더 트리 (고정 컬럼 → 기관 → 노선 → 지급/수급)
    pub fn to_tree(&self) -> Vec<ColumnNode> {
        let fixed = self
            .fixed
            .iter()
            .map(|key| ColumnNode::leaf(key, key.clone()));

        let agencies = self.agencies.iter().map(|agency| ColumnNode {
            header: agency.agency.clone(),
            field: None,
            children: agency
                .lines
                .iter()
                .map(|line| ColumnNode {
                    header: line.line.clone(),
                    field: None,
                    children: line
                        .sides
                        .iter()
                        .map(|side| {
                            let key = SettlementKey {
                                agency: agency.agency.clone(),
                                line: line.line.clone(),
                                side: *side,
                            };
                            ColumnNode::leaf(side.label(), key.field())
                        })
                        .collect(),
                })
                .collect(),
        });

        fixed.chain(agencies).collect()
    }

    /// 평면 필드 순서 (내보내기용)
    pub fn fields(&self) -> Vec<String> {
        let mut fields = self.fixed.clone();
        for agency in &self.agencies {
            for line in &agency.lines {
                for side in &line.sides {
                    fields.push(format!("{}_{}_{}", agency.agency, line.line, side.label()));
                }
            }
        }
        fields
    }
}

/// 정산 행들의 키로 컬럼 구성
pub fn plan_columns(rows: &[Value]) -> ColumnPlan {
    let mut plan = ColumnPlan::default();
    for (i, row) in rows.iter().enumerate() {
        match row.as_object() {
            Some(object) => object.keys().for_each(|key| plan.add_key(key)),
            None => warn!(row = i, "객체가 아닌 정산 행을 건너뜀"),
        }
    }
    plan
}

/// 기관별 지급 / 수급 합계
///
/// 금액에 소수가 섞여 오므로 `f64` 로 누적한다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgencyTotals {
    pub agency: String,
    pub pay: f64,
    pub receive: f64,
}

impl AgencyTotals {
    /// 수급 - 지급
    pub fn balance(&self) -> f64 {
        self.receive - self.pay
    }
}

/// 기관별 지급 / 수급 합계 계산
///
/// 숫자, 숫자 문자열(쉼표・소수 허용)만 더하고 나머지는 경고 후 0 으로 본다.
pub fn side_totals(rows: &[Value], plan: &ColumnPlan) -> Vec<AgencyTotals> {
    plan.agencies
        .iter()
        .map(|agency| {
            let mut totals = AgencyTotals {
                agency: agency.agency.clone(),
                pay: 0.0,
                receive: 0.0,
            };
            for object in rows.iter().filter_map(Value::as_object) {
                for line in &agency.lines {
                    for side in &line.sides {
                        let field = format!("{}_{}_{}", agency.agency, line.line, side.label());
                        let amount = amount_of(object, &field);
                        match side {
                            Side::Pay => totals.pay += amount,
                            Side::Receive => totals.receive += amount,
                        }
                    }
                }
            }
            totals
        })
        .collect()
}

fn amount_of(object: &Map<String, Value>, field: &str) -> f64 {
    let amount = match object.get(field) {
        None | Some(Value::Null) => return 0.0,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return 0.0,
        Some(Value::String(s)) => s.replace(',', "").trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match amount.filter(|a| a.is_finite()) {
        Some(amount) => amount,
        None => {
            warn!(field, value = %object[field], "금액으로 해석할 수 없는 값, 0 으로 처리");
            0.0
        }
    }
}
