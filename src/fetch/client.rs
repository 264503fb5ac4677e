use async_trait::async_trait;
use reqwest::{Request, Response};

/// Sends a prepared request. Wrappers such as [`BearerToken`](super::BearerToken)
/// adjust the request and delegate to an inner client; tests substitute
/// canned responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
