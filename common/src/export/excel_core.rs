//! Excel 생성 (공통 라이브러리)
//!
//! 그리드 행을 한 시트로 내보낸다. 화면에서는 빈 값으로 흉내 내던 셀 병합을
//! Excel 에서는 실제 병합 셀로 만든다.

use crate::grid::GroupedRow;
use rust_xlsxwriter::*;

/// 그리드 컬럼 정의
pub struct GridColumn {
    pub header: &'static str,
    pub width: f64,
}

pub const GRID_COLUMNS: [GridColumn; 7] = [
    GridColumn { header: "그룹", width: 8.0 },
    GridColumn { header: "주요 역", width: 36.0 },
    GridColumn { header: "확정 여부", width: 10.0 },
    GridColumn { header: "순번", width: 8.0 },
    GridColumn { header: "상세 경로", width: 60.0 },
    GridColumn { header: "이용 건수", width: 12.0 },
    GridColumn { header: "선택", width: 8.0 },
];

const COL_GROUP: u16 = 0;
const COL_MAIN: u16 = 1;
const COL_CONFIRMED: u16 = 2;
const COL_RN: u16 = 3;
const COL_PATH: u16 = 4;
const COL_CNT: u16 = 5;
const COL_SELECTED: u16 = 6;

const TITLE_ROW: u32 = 0;
const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;

/// 연속 구간 `[start, end]` (행 인덱스, 양끝 포함)
///
/// `starts_block` 이 참인 행에서 새 구간이 시작된다.
pub fn block_spans<F>(rows: &[GroupedRow], starts_block: F) -> Vec<(usize, usize)>
where
    F: Fn(&GroupedRow) -> bool,
{
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match spans.last_mut() {
            Some(span) if !starts_block(row) => span.1 = i,
            _ => spans.push((i, i)),
        }
    }
    spans
}

fn write_span(
    worksheet: &mut Worksheet,
    span: (usize, usize),
    col: u16,
    value: &str,
    format: &Format,
) -> Result<(), String> {
    let first = FIRST_DATA_ROW + span.0 as u32;
    let last = FIRST_DATA_ROW + span.1 as u32;
    if last > first {
        worksheet
            .merge_range(first, col, last, col, value, format)
            .map_err(|e| format!("셀 병합 에러: {}", e))?;
    } else {
        worksheet
            .write_string_with_format(first, col, value, format)
            .map_err(|e| format!("셀 쓰기 에러: {}", e))?;
    }
    Ok(())
}

/// 그리드 Excel 을 버퍼로 생성
///
/// # Arguments
/// * `rows` - `project_rows` 결과 (그룹 순으로 정렬된 상태)
/// * `title` - 시트 첫 행 제목
pub fn generate_grid_excel(rows: &[GroupedRow], title: &str) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let title_format = Format::new()
        .set_bold()
        .set_font_size(14.0)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter);

    let header_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let span_format = Format::new()
        .set_font_size(10.0)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let value_format = Format::new()
        .set_font_size(10.0)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let number_format = value_format
        .clone()
        .set_align(FormatAlign::Right)
        .set_num_format("#,##0");

    let selected_format = value_format
        .clone()
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(0xFFF4CC));

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("경로")
        .map_err(|e| format!("시트 이름 설정 에러: {}", e))?;

    for (col, column) in GRID_COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet
            .set_column_width(col, column.width)
            .map_err(|e| format!("열 너비 설정 에러: {}", e))?;
        worksheet
            .write_string_with_format(HEADER_ROW, col, column.header, &header_format)
            .map_err(|e| format!("헤더 쓰기 에러: {}", e))?;
    }

    worksheet
        .merge_range(TITLE_ROW, 0, TITLE_ROW, COL_SELECTED, title, &title_format)
        .map_err(|e| format!("제목 병합 에러: {}", e))?;

    // 그룹 / 주요 역 / 확정 여부 병합 셀
    for span in block_spans(rows, |r| r.is_first_in_group) {
        let head = &rows[span.0];
        write_span(worksheet, span, COL_GROUP, &head.group_no.to_string(), &span_format)?;
        write_span(worksheet, span, COL_MAIN, &head.main_stations, &span_format)?;
    }
    for span in block_spans(rows, |r| r.is_first_confirmed_in_group) {
        let label = rows[span.0]
            .confirmed_path_display
            .as_shown()
            .cloned()
            .unwrap_or_default();
        write_span(worksheet, span, COL_CONFIRMED, &label, &span_format)?;
    }

    // 행별 값
    for (i, row) in rows.iter().enumerate() {
        let excel_row = FIRST_DATA_ROW + i as u32;
        worksheet
            .write_number_with_format(excel_row, COL_RN, row.rn as f64, &number_format)
            .map_err(|e| format!("값 쓰기 에러: {}", e))?;
        worksheet
            .write_string_with_format(excel_row, COL_PATH, &row.path_nm, &value_format)
            .map_err(|e| format!("값 쓰기 에러: {}", e))?;
        worksheet
            .write_number_with_format(excel_row, COL_CNT, row.cnt as f64, &number_format)
            .map_err(|e| format!("값 쓰기 에러: {}", e))?;

        let (mark, format) = if row.is_selected {
            ("✔", &selected_format)
        } else {
            ("", &value_format)
        };
        worksheet
            .write_string_with_format(excel_row, COL_SELECTED, mark, format)
            .map_err(|e| format!("값 쓰기 에러: {}", e))?;
    }

    worksheet
        .set_freeze_panes(FIRST_DATA_ROW, 0)
        .map_err(|e| format!("틀 고정 에러: {}", e))?;

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel 저장 에러: {}", e))
}
