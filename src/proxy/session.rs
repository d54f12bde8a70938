//! 세션 변환
//!
//! 브라우저에는 자체 발급한 `ext_sid` 쿠키만 주고,
//! 업스트림 `JSESSIONID` 는 서버 쪽 대응표에만 보관한다.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub const EXT_SID_COOKIE: &str = "ext_sid";
pub const UPSTREAM_SESSION_COOKIE: &str = "JSESSIONID";

#[derive(Debug, Clone)]
struct SessionEntry {
    jsessionid: String,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

/// ext_sid → JSESSIONID 대응표
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.last_seen > self.ttl
    }

    /// 연결된 JSESSIONID 조회 (조회 시 유휴 시간 갱신)
    pub fn resolve(&self, ext_sid: &str) -> Option<String> {
        self.resolve_at(ext_sid, Utc::now())
    }

    pub fn resolve_at(&self, ext_sid: &str, now: DateTime<Utc>) -> Option<String> {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let expired = self.is_expired(map.get(ext_sid)?, now);
        if expired {
            map.remove(ext_sid);
            return None;
        }
        let entry = map.get_mut(ext_sid)?;
        entry.last_seen = now;
        Some(entry.jsessionid.clone())
    }

    /// JSESSIONID 연결
    ///
    /// 알고 있는 ext_sid 면 그대로 다시 연결하고, 모르는 값이거나 없으면 새로 발급한다.
    /// 돌려주는 값이 브라우저에 내려줄 ext_sid.
    pub fn bind(&self, ext_sid: Option<&str>, jsessionid: &str) -> String {
        self.bind_at(ext_sid, jsessionid, Utc::now())
    }

    pub fn bind_at(&self, ext_sid: Option<&str>, jsessionid: &str, now: DateTime<Utc>) -> String {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());

        if let Some(sid) = ext_sid {
            if let Some(entry) = map.get_mut(sid) {
                entry.jsessionid = jsessionid.to_string();
                entry.last_seen = now;
                return sid.to_string();
            }
        }

        let sid = generate_ext_sid();
        map.insert(
            sid.clone(),
            SessionEntry {
                jsessionid: jsessionid.to_string(),
                created_at: now,
                last_seen: now,
            },
        );
        sid
    }

    pub fn remove(&self, ext_sid: &str) -> bool {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.remove(ext_sid).is_some()
    }

    /// 만료된 세션 정리, 정리한 개수 반환
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let before = map.len();
        map.retain(|_, entry| now - entry.last_seen <= self.ttl);
        before - map.len()
    }

    /// 세션이 만들어진 시각
    pub fn created_at(&self, ext_sid: &str) -> Option<DateTime<Utc>> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(ext_sid).map(|entry| entry.created_at)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 32자리 16진수 ext_sid
fn generate_ext_sid() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// `Cookie` 헤더에서 값 추출
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim().trim_matches('"').to_string())
    })
}

/// `Set-Cookie` 헤더 하나에서 값 추출 (속성 앞 첫 쌍만 본다)
pub fn set_cookie_value(set_cookie: &str, name: &str) -> Option<String> {
    let first = set_cookie.split(';').next()?;
    let (key, value) = first.trim().split_once('=')?;
    (key.trim() == name && !value.trim().is_empty()).then(|| value.trim().to_string())
}

pub fn ext_sid_cookie(ext_sid: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", EXT_SID_COOKIE, ext_sid)
}

pub fn expired_ext_sid_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", EXT_SID_COOKIE)
}

pub fn upstream_cookie(jsessionid: &str) -> String {
    format!("{}={}", UPSTREAM_SESSION_COOKIE, jsessionid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(std::time::Duration::from_secs(30 * 60))
    }

    #[test]
    fn test_bind_new_session() {
        let store = store();
        let sid = store.bind(None, "J1");
        assert_eq!(sid.len(), 32);
        assert!(sid.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(store.resolve(&sid), Some("J1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rebind_known_session() {
        let store = store();
        let sid = store.bind(None, "J1");
        let again = store.bind(Some(&sid), "J2");
        assert_eq!(sid, again);
        assert_eq!(store.resolve(&sid), Some("J2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_ext_sid_is_not_adopted() {
        let store = store();
        let sid = store.bind(Some("attacker-chosen"), "J1");
        assert_ne!(sid, "attacker-chosen");
        assert_eq!(store.resolve("attacker-chosen"), None);
    }

    #[test]
    fn test_expired_session() {
        let store = store();
        let now = Utc::now();
        let sid = store.bind_at(None, "J1", now);

        assert!(store.resolve_at(&sid, now + Duration::minutes(29)).is_some());
        // 조회로 유휴 시간이 갱신됨
        assert!(store.resolve_at(&sid, now + Duration::minutes(58)).is_some());
        assert!(store.resolve_at(&sid, now + Duration::minutes(90)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_huge_ttl_does_not_expire() {
        let store = SessionStore::new(std::time::Duration::from_secs(u64::MAX));
        let now = Utc::now();
        let sid = store.bind_at(None, "J1", now);

        assert!(store.resolve_at(&sid, now + Duration::days(3650)).is_some());
    }

    #[test]
    fn test_purge_expired() {
        let store = store();
        let now = Utc::now();
        let old = store.bind_at(None, "J1", now - Duration::hours(2));
        let fresh = store.bind_at(None, "J2", now);

        assert_eq!(store.purge_expired_at(now), 1);
        assert!(store.created_at(&old).is_none());
        assert!(store.created_at(&fresh).is_some());
    }

    #[test]
    fn test_remove() {
        let store = store();
        let sid = store.bind(None, "J1");
        assert!(store.remove(&sid));
        assert!(!store.remove(&sid));
    }

    #[test]
    fn test_cookie_value() {
        let header = "theme=dark; ext_sid=abc123; other=\"x\"";
        assert_eq!(cookie_value(header, "ext_sid"), Some("abc123".to_string()));
        assert_eq!(cookie_value(header, "other"), Some("x".to_string()));
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("", "ext_sid"), None);
    }

    #[test]
    fn test_set_cookie_value() {
        let header = "JSESSIONID=ABCDEF; Path=/fare; HttpOnly";
        assert_eq!(set_cookie_value(header, "JSESSIONID"), Some("ABCDEF".to_string()));
        assert_eq!(set_cookie_value("Path=/; JSESSIONID=X", "JSESSIONID"), None);
        assert_eq!(set_cookie_value("JSESSIONID=; Max-Age=0", "JSESSIONID"), None);
    }

    #[test]
    fn test_cookie_strings() {
        assert_eq!(ext_sid_cookie("s1"), "ext_sid=s1; Path=/; HttpOnly; SameSite=Lax");
        assert!(expired_ext_sid_cookie().contains("Max-Age=0"));
        assert_eq!(upstream_cookie("J1"), "JSESSIONID=J1");
    }
}
