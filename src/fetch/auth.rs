use crate::error::{ApiError, Result};
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// An [`HttpClient`] wrapper that sends `Authorization: Bearer <token>` on
/// every request.
///
/// The header value is built once up front, so a token that cannot be sent
/// is reported before any request goes out.
pub struct BearerToken<C> {
    inner: C,
    value: HeaderValue,
}

impl<C> BearerToken<C> {
    pub fn new(inner: C, token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::MissingToken(crate::TOKEN_ENV_VAR));
        }
        let mut value =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| ApiError::InvalidToken)?;
        value.set_sensitive(true);
        Ok(Self { inner, value })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for BearerToken<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(AUTHORIZATION, self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Option<HeaderValue>>);

    #[async_trait]
    impl HttpClient for Capture {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            *self.0.lock().unwrap() = req.headers().get(AUTHORIZATION).cloned();
            Ok(http::Response::new("{}").into())
        }
    }

    #[tokio::test]
    async fn test_bearer_header_injected() {
        let client = BearerToken::new(Capture::default(), " abc123 ").unwrap();
        let req = reqwest::Request::new(
            reqwest::Method::GET,
            "https://example.com/events".parse().unwrap(),
        );

        client.execute(req).await.unwrap();

        let sent = client.inner.0.lock().unwrap().clone().unwrap();
        assert_eq!(sent.to_str().unwrap(), "Bearer abc123");
        assert!(sent.is_sensitive());
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = BearerToken::new(Capture::default(), "   ").err().unwrap();
        assert!(matches!(err, ApiError::MissingToken(_)));
    }

    #[test]
    fn test_token_with_newline_rejected() {
        let err = BearerToken::new(Capture::default(), "abc\ndef").err().unwrap();
        assert!(matches!(err, ApiError::InvalidToken));
    }
}
