use reqwest::StatusCode;
use thiserror::Error;

/// Terminal failure of one ask-request. None of these are retried.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{key_env} is not set in the environment")]
    MissingCredential { key_env: &'static str },

    #[error("screenshot is {size} bytes, larger than the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("failed to encode upstream request: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("upstream API error {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("could not extract an answer from the upstream response: {0}")]
    Extraction(String),
}

impl AskError {
    /// Status the inbound surface answers with for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingCredential { .. } | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Transport(source) if source.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport(_) | Self::Upstream { .. } | Self::Extraction(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::AskError;
    use reqwest::StatusCode;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn validation_maps_to_client_error() {
        let err = AskError::Validation("question is required".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
    }

    #[test]
    fn server_side_failures_map_to_server_errors() {
        let upstream = AskError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            message: "invalid key".to_string(),
        };
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);

        let missing = AskError::MissingCredential {
            key_env: "LLM_API_KEY",
        };
        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(missing.to_string(), "LLM_API_KEY is not set in the environment");

        let extraction = AskError::Extraction("no choices".to_string());
        assert!(extraction.status_code().is_server_error());
    }

    #[test]
    fn transport_timeout_maps_to_gateway_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("local addr");
        let silent = thread::spawn(move || {
            // Hold the connection open without ever answering.
            let (_stream, _) = listener.accept().expect("accept");
            thread::sleep(Duration::from_millis(500));
        });

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .expect("client");
        let source = client
            .post(format!("http://{addr}/v1/chat/completions"))
            .body("{}")
            .send()
            .expect_err("request should time out");
        assert!(source.is_timeout());

        let err = AskError::Transport(source);
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(!err.is_client_error());
        silent.join().expect("listener thread");
    }

    #[test]
    fn refused_connection_maps_to_bad_gateway() {
        let source = reqwest::blocking::Client::new()
            .post("http://127.0.0.1:9/v1/chat/completions")
            .send()
            .expect_err("nothing listens on port 9");
        assert!(!source.is_timeout());
        assert_eq!(
            AskError::Transport(source).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
