use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::assistant::error::AskError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Status and body of an upstream reply, whatever the status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs one POST with a bearer token. Non-2xx replies are returned, not failed.
pub fn send(url: &str, api_key: &str, body: Vec<u8>) -> Result<RawResponse, AskError> {
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(AskError::Transport)?;

    debug!(url, bytes = body.len(), "sending upstream request");
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .map_err(AskError::Transport)?;

    let status = response.status();
    let body = response.bytes().map_err(AskError::Transport)?.to_vec();
    debug!(%status, bytes = body.len(), "received upstream response");

    Ok(RawResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::send;
    use crate::assistant::error::AskError;

    #[test]
    fn non_success_status_is_returned_with_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", "application/json")
            .with_status(429)
            .with_body("slow down")
            .create();

        let url = format!("{}/v1/chat/completions", server.url());
        let response = send(&url, "test-key", b"{}".to_vec()).expect("response");

        assert_eq!(response.status.as_u16(), 429);
        assert_eq!(response.body_text(), "slow down");
        mock.assert();
    }

    #[test]
    fn connection_failure_is_a_transport_error() {
        let result = send("http://127.0.0.1:9/unreachable", "test-key", b"{}".to_vec());
        assert!(matches!(result, Err(AskError::Transport(_))));
    }
}
