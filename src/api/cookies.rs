use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::core::config::Settings;

/// Session cookie attributes derived from settings.
#[derive(Debug, Clone)]
pub(crate) struct SessionCookie {
    name: String,
    secure: bool,
    max_age: Duration,
}

impl SessionCookie {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        let seconds = settings.security().session_expire_minutes.saturating_mul(60);
        Self {
            name: settings.session().cookie_name.clone(),
            secure: settings.session().cookie_secure,
            max_age: Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX)),
        }
    }

    fn build(&self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((self.name.clone(), value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .build()
    }

    /// Jar that sets the session cookie to `token`.
    pub(crate) fn issue(&self, token: String) -> CookieJar {
        CookieJar::new().add(self.build(token, self.max_age))
    }

    /// Jar that expires the session cookie in the browser.
    pub(crate) fn clear(&self) -> CookieJar {
        CookieJar::new().add(self.build(String::new(), Duration::ZERO))
    }

    pub(crate) fn read(&self, headers: &HeaderMap) -> Option<String> {
        CookieJar::from_headers(headers)
            .get(&self.name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Session token from the cookie, falling back to a `Bearer` header.
pub(crate) fn session_token(headers: &HeaderMap, cookie: &SessionCookie) -> Option<String> {
    cookie.read(headers).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::response::IntoResponse;

    use super::*;

    fn cookie(secure: bool) -> SessionCookie {
        SessionCookie {
            name: "academy_session".to_string(),
            secure,
            max_age: Duration::hours(24),
        }
    }

    fn set_cookie_header(jar: CookieJar) -> String {
        let response = jar.into_response();
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("set-cookie")
            .to_string()
    }

    #[test]
    fn issued_cookie_is_http_only() {
        let value = set_cookie_header(cookie(false).issue("abc".to_string()));
        assert!(value.starts_with("academy_session=abc"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age=86400"));
        assert!(!value.contains("Secure"));

        assert!(set_cookie_header(cookie(true).issue("abc".to_string())).contains("Secure"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let value = set_cookie_header(cookie(false).clear());
        assert!(value.starts_with("academy_session=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn token_prefers_cookie_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; academy_session=c1"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer b1"));
        assert_eq!(session_token(&headers, &cookie(false)).as_deref(), Some("c1"));

        headers.insert(header::COOKIE, HeaderValue::from_static("academy_session="));
        assert_eq!(session_token(&headers, &cookie(false)).as_deref(), Some("b1"));

        headers.remove(header::COOKIE);
        headers.remove(header::AUTHORIZATION);
        assert_eq!(session_token(&headers, &cookie(false)), None);
    }
}
