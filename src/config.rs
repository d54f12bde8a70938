use crate::error::{FareRouteError, Result};
use fare_route_common::GroupingStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 업스트림 주소를 덮어쓰는 환경 변수
pub const UPSTREAM_ENV: &str = "FARE_UPSTREAM_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 레거시 백엔드 주소 (예: http://10.0.0.5:8080/fare)
    pub upstream_base_url: Option<String>,
    pub bind_addr: String,
    /// ext_sid 세션 유휴 만료 시간
    pub session_ttl_minutes: u64,
    pub timeout_seconds: u64,
    pub default_strategy: GroupingStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_base_url: None,
            bind_addr: "127.0.0.1:3100".into(),
            session_ttl_minutes: 30, // 업스트림 JSESSIONID 기본 만료와 맞춤
            timeout_seconds: 30,
            default_strategy: GroupingStrategy::TransferSet,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FareRouteError::Config("홈 디렉터리를 찾을 수 없습니다".into()))?;
        Ok(home.join(".config").join("fare-route").join("config.json"))
    }

    /// 업스트림 주소 (환경 변수 우선, 끝의 `/` 제거)
    pub fn upstream_url(&self) -> Result<String> {
        let url = match std::env::var(UPSTREAM_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => self.upstream_base_url.clone().ok_or(FareRouteError::MissingUpstream)?,
        };
        normalize_base_url(&url)
    }

    /// 세션 유휴 만료 시간 (큰 값은 넘치지 않게 포화)
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes.saturating_mul(60))
    }

    pub fn set_upstream(&mut self, url: String) -> Result<()> {
        self.upstream_base_url = Some(normalize_base_url(&url)?);
        self.save()
    }
}

/// 베이스 주소 검증 (http/https 만 허용)
pub fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(FareRouteError::Config(format!(
            "업스트림 주소는 http:// 또는 https:// 로 시작해야 합니다: {}",
            url
        )));
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3100");
        assert_eq!(config.session_ttl_minutes, 30);
        assert!(config.upstream_base_url.is_none());
    }

    #[test]
    fn test_session_ttl() {
        let mut config = Config::default();
        assert_eq!(config.session_ttl(), Duration::from_secs(30 * 60));

        config.session_ttl_minutes = u64::MAX;
        assert_eq!(config.session_ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://host:8080/fare/").unwrap(), "http://host:8080/fare");
        assert!(normalize_base_url("ftp://host").is_err());
        assert!(normalize_base_url("host:8080").is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"timeout_seconds": 5}"#).unwrap();
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.bind_addr, "127.0.0.1:3100");
        assert_eq!(config.default_strategy, GroupingStrategy::TransferSet);
    }
}
