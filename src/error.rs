use thiserror::Error;

#[derive(Error, Debug)]
pub enum FareRouteError {
    #[error("설정 에러: {0}")]
    Config(String),

    #[error("업스트림 주소가 설정되지 않았습니다. `fare-route config --set-upstream URL` 로 설정하세요")]
    MissingUpstream,

    #[error("파일을 찾을 수 없습니다: {0}")]
    FileNotFound(String),

    #[error("허용되지 않는 엔드포인트: {0}")]
    InvalidEndpoint(String),

    #[error("업스트림 호출 에러: {0}")]
    Upstream(String),

    #[error("업스트림 응답 시간 초과: {0}")]
    UpstreamTimeout(String),

    #[error("업스트림이 에러 페이지를 반환했습니다: {0}")]
    UpstreamErrorPage(String),

    #[error("Excel 생성 에러: {0}")]
    ExcelGeneration(String),

    #[error("JSON 해석 에러: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("데이터 가공 에러: {0}")]
    Common(#[from] fare_route_common::Error),
}

impl From<reqwest::Error> for FareRouteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FareRouteError::UpstreamTimeout(e.to_string())
        } else {
            FareRouteError::Upstream(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, FareRouteError>;
