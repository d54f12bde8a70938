use clap::{Parser, Subcommand};
use fare_route_common::GroupingStrategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fare-route")]
#[command(about = "정산 대시보드 경로 검색 결과 가공・세션 변환 프록시", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 상세 로그 출력
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 경로 검색 결과를 그리드 행(JSON)으로 변환
    Grid {
        /// 업스트림 응답 파일
        #[arg(required = true)]
        input: PathBuf,

        /// 선택된 경로 파일
        #[arg(short, long)]
        selected: Option<PathBuf>,

        /// 그룹 방식 (transfer-set/path-key, 생략 시 설정값)
        #[arg(long)]
        strategy: Option<GroupingStrategy>,

        /// 출력 JSON 파일 (생략 시 표준 출력)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 그룹별 주요 역 요약 출력
    Stations {
        /// 업스트림 응답 파일
        #[arg(required = true)]
        input: PathBuf,

        /// 그룹 방식 (transfer-set/path-key)
        #[arg(long)]
        strategy: Option<GroupingStrategy>,
    },

    /// 정산 데이터의 컬럼 구성과 기관별 합계 출력
    Columns {
        /// 업스트림 응답 파일
        #[arg(required = true)]
        input: PathBuf,

        /// 출력 JSON 파일 (생략 시 표준 출력)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 그리드를 Excel 로 내보내기
    Export {
        /// 업스트림 응답 파일
        #[arg(required = true)]
        input: PathBuf,

        /// 선택된 경로 파일
        #[arg(short, long)]
        selected: Option<PathBuf>,

        /// 그룹 방식 (transfer-set/path-key)
        #[arg(long)]
        strategy: Option<GroupingStrategy>,

        /// 출력 파일/디렉터리
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 시트 제목
        #[arg(short, long, default_value = "경로 검색 결과")]
        title: String,
    },

    /// 세션 변환 프록시 실행
    Serve {
        /// 바인드 주소 (생략 시 설정값)
        #[arg(short, long)]
        bind: Option<String>,

        /// 업스트림 주소 (생략 시 환경 변수 / 설정값)
        #[arg(short, long)]
        upstream: Option<String>,
    },

    /// 설정 표시/편집
    Config {
        /// 업스트림 주소 설정
        #[arg(long)]
        set_upstream: Option<String>,

        /// 설정 표시
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grid() {
        let cli = Cli::parse_from(["fare-route", "grid", "in.json", "--strategy", "path-key", "-o", "out.json"]);
        match cli.command {
            Commands::Grid { input, strategy, output, selected } => {
                assert_eq!(input, PathBuf::from("in.json"));
                assert_eq!(strategy, Some(GroupingStrategy::PathKey));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(selected.is_none());
            }
            _ => panic!("Grid 를 기대함"),
        }
    }

    #[test]
    fn test_parse_serve_verbose() {
        let cli = Cli::parse_from(["fare-route", "serve", "--bind", "0.0.0.0:8000", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { bind: Some(_), upstream: None }));
    }

    #[test]
    fn test_parse_bad_strategy() {
        assert!(Cli::try_parse_from(["fare-route", "stations", "in.json", "--strategy", "zzz"]).is_err());
    }
}
