//! Excel 출력 (CLI 판)

use crate::error::{FareRouteError, Result};
use fare_route_common::export::excel_core::generate_grid_excel;
use fare_route_common::GroupedRow;
use std::path::{Path, PathBuf};

/// 제목을 파일 이름으로 쓸 수 있게 경로 구분자 등을 `_` 로 바꾼다
pub fn file_stem_for(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.trim_matches('.').is_empty() {
        "export".to_string()
    } else {
        stem
    }
}

/// 디렉터리거나 확장자가 없으면 `{title}.xlsx` 를 붙인다
pub fn output_path_for(output: &Path, title: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.xlsx", file_stem_for(title)))
    } else {
        output.to_path_buf()
    }
}

pub fn export_grid_excel(rows: &[GroupedRow], output: &Path, title: &str) -> Result<PathBuf> {
    let output_path = output_path_for(output, title);
    let buffer = generate_grid_excel(rows, title).map_err(FareRouteError::ExcelGeneration)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, buffer)?;
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_file() {
        assert_eq!(
            output_path_for(Path::new("/tmp/out/grid.xlsx"), "경로"),
            PathBuf::from("/tmp/out/grid.xlsx")
        );
    }

    #[test]
    fn test_title_with_separators_stays_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path_for(dir.path(), "2024/01 ../경로");
        assert_eq!(path, dir.path().join("2024_01 .._경로.xlsx"));
        assert_eq!(path.parent(), Some(dir.path()));
    }

    #[test]
    fn test_file_stem_for() {
        assert_eq!(file_stem_for("경로 검색 결과"), "경로 검색 결과");
        assert_eq!(file_stem_for(r"a\b:c"), "a_b_c");
        assert_eq!(file_stem_for(".."), "export");
        assert_eq!(file_stem_for("  "), "export");
    }

    #[test]
    fn test_output_path_for_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(output_path_for(dir.path(), "경로"), dir.path().join("경로.xlsx"));
        assert_eq!(
            output_path_for(Path::new("reports"), "경로"),
            PathBuf::from("reports/경로.xlsx")
        );
    }
}
