use mockito::{Matcher, Server};
use pageask::assistant::image::MAX_IMAGE_BYTES;
use pageask::assistant::{self, AskError, AskRequest, AssistantConfig, Usage};
use serde_json::json;

const CHAT_PATH: &str = "/v1/chat/completions";
const RESPONSES_PATH: &str = "/v1/responses";

fn config_for(server: &Server) -> AssistantConfig {
    AssistantConfig {
        api_key: Some("sk-test".to_string()),
        model: "gpt-4o-mini".to_string(),
        chat_url: format!("{}{CHAT_PATH}", server.url()),
        responses_url: format!("{}{RESPONSES_PATH}", server.url()),
    }
}

fn page_request() -> AskRequest {
    AskRequest {
        question: "What is this page about?".to_string(),
        url: "https://example.com".to_string(),
        title: "Example".to_string(),
        page_content: Some(String::new()),
        screenshot: Some(String::new()),
        use_web_search: false,
        is_simple: false,
    }
}

#[test]
fn plain_text_request_returns_answer_and_usage() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", CHAT_PATH)
        .match_header("authorization", "Bearer sk-test")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 2000
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{ "message": { "role": "assistant", "content": "It's an example page." } }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
            })
            .to_string(),
        )
        .create();

    let result = assistant::ask(&page_request(), &config_for(&server)).expect("answer");

    assert_eq!(result.answer, "It's an example page.");
    assert_eq!(
        result.usage,
        Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }
    );
    mock.assert();
}

#[test]
fn web_search_request_uses_responses_endpoint() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", RESPONSES_PATH)
        .match_body(Matcher::PartialJson(json!({
            "input": "What is this page about?",
            "tools": [{ "type": "web_search_preview" }]
        })))
        .with_status(200)
        .with_body(
            json!({
                "output": [
                    { "type": "web_search_call", "id": "ws_1", "status": "completed" },
                    {
                        "type": "message",
                        "content": [{ "type": "output_text", "text": "Result found." }]
                    }
                ],
                "usage": { "input_tokens": 12, "output_tokens": 4, "total_tokens": 16 }
            })
            .to_string(),
        )
        .create();

    let request = AskRequest {
        use_web_search: true,
        screenshot: Some("AAAA".to_string()),
        ..page_request()
    };
    let result = assistant::ask(&request, &config_for(&server)).expect("answer");

    assert_eq!(result.answer, "Result found.");
    assert_eq!(result.usage.prompt_tokens, 12);
    assert_eq!(result.usage.completion_tokens, 4);
    assert_eq!(result.usage.total_tokens, 16);
    mock.assert();
}

#[test]
fn vision_request_sends_low_detail_data_uri() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", CHAT_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""url":"data:image/jpeg;base64,AAAA""#.to_string()),
            Matcher::Regex(r#""detail":"low""#.to_string()),
        ]))
        .with_status(200)
        .with_body(json!({ "choices": [{ "message": { "content": "A chart." } }] }).to_string())
        .create();

    let request = AskRequest {
        screenshot: Some("AAAA".to_string()),
        ..page_request()
    };
    let result = assistant::ask(&request, &config_for(&server)).expect("answer");

    assert_eq!(result.answer, "A chart.");
    assert_eq!(result.usage, Usage::default());
    mock.assert();
}

#[test]
fn structured_upstream_error_is_surfaced() {
    let mut server = Server::new();
    server
        .mock("POST", CHAT_PATH)
        .with_status(401)
        .with_body(r#"{"error":{"message":"invalid key","type":"auth","code":"401"}}"#)
        .create();

    match assistant::ask(&page_request(), &config_for(&server)) {
        Err(AskError::Upstream { status, message }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "invalid key");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[test]
fn unrecognized_success_body_is_an_extraction_error() {
    let mut server = Server::new();
    server
        .mock("POST", CHAT_PATH)
        .with_status(200)
        .with_body(r#"{"status":"ok","data":[]}"#)
        .create();

    assert!(matches!(
        assistant::ask(&page_request(), &config_for(&server)),
        Err(AskError::Extraction(_))
    ));
}

#[test]
fn oversized_screenshot_never_reaches_upstream() {
    let mut server = Server::new();
    let mock = server.mock("POST", CHAT_PATH).expect(0).create();

    let request = AskRequest {
        screenshot: Some("A".repeat(MAX_IMAGE_BYTES + 1)),
        ..page_request()
    };
    assert!(matches!(
        assistant::ask(&request, &config_for(&server)),
        Err(AskError::PayloadTooLarge { .. })
    ));
    mock.assert();
}

#[test]
fn missing_credential_never_reaches_upstream() {
    let mut server = Server::new();
    let mock = server.mock("POST", CHAT_PATH).expect(0).create();

    let config = AssistantConfig {
        api_key: None,
        ..config_for(&server)
    };
    assert!(matches!(
        assistant::ask(&page_request(), &config),
        Err(AskError::MissingCredential { .. })
    ));
    mock.assert();
}
