//! The per-request orchestration flow.
//!
//! One orchestration call owns exactly one [`ConversationMemory`] and one
//! adapter, both scoped to the request lifetime. Concurrent requests share
//! no mutable state; each call reconstructs memory from the message list it
//! receives.

use std::sync::Arc;

use tracing::{debug, error};

use switchboard_core::memory::{ConversationMemory, TurnHandle};
use switchboard_core::types::{ChatRequest, ChatResponse, Message, ProviderKind, Role};
use switchboard_core::{GatewayError, Settings};
use switchboard_providers::factory::{build_adapter, ProviderParams};

// ─────────────────────────────────────────────
// History replay
// ─────────────────────────────────────────────

/// Replay prior messages into memory.
///
/// User messages open turns, assistant messages close the pending turn, and
/// system messages overwrite the instruction (last write wins — the
/// instruction always renders at the head of the provider context, wherever
/// it appeared in the list). An assistant message with no pending turn is
/// malformed history.
pub fn replay_history(
    memory: &mut ConversationMemory,
    messages: &[Message],
) -> Result<(), GatewayError> {
    let mut pending: Option<TurnHandle> = None;
    for (position, message) in messages.iter().enumerate() {
        match message.role {
            Role::User => {
                // A still-pending turn stays open; it renders with an empty
                // reply slot.
                pending = Some(memory.open_turn(&message.content));
            }
            Role::Assistant => {
                let handle = pending
                    .take()
                    .ok_or(GatewayError::DanglingReply { position })?;
                memory.close_turn(handle, &message.content);
            }
            Role::System => {
                memory.set_system_instruction(&message.content);
            }
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────
// ChatOrchestrator
// ─────────────────────────────────────────────

/// Turns a validated chat request into one assistant reply.
///
/// Holds the process-wide [`Settings`] for credential fallback; everything
/// else is allocated per request and dropped at the end of `handle`.
pub struct ChatOrchestrator {
    settings: Arc<Settings>,
}

impl ChatOrchestrator {
    /// Create an orchestrator over settings loaded once at startup.
    pub fn new(settings: Arc<Settings>) -> Self {
        ChatOrchestrator { settings }
    }

    /// Process one chat request against the given backend.
    ///
    /// `credential` is the per-request API key (e.g. from a request header);
    /// when absent, the process-wide configured key for the backend is used.
    /// Any failure surfaces as a single [`GatewayError`] — no partial
    /// responses.
    pub async fn handle(
        &self,
        provider: ProviderKind,
        request: ChatRequest,
        credential: Option<String>,
    ) -> Result<ChatResponse, GatewayError> {
        request.validate()?;

        let credential = credential
            .or_else(|| self.settings.api_key_for(provider).map(String::from));
        let params = ProviderParams::from_request(&request, credential);
        let adapter = build_adapter(provider, params)?;

        // The final message is the one we generate a reply to; everything
        // before it is history. validate() already rejected the empty list.
        let Some((last, history)) = request.messages.split_last() else {
            return Err(GatewayError::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        };

        let mut memory = ConversationMemory::new();
        replay_history(&mut memory, history)?;

        debug!(
            provider = %provider,
            history_turns = memory.len(),
            has_system = memory.system_instruction().is_some(),
            "dispatching generation"
        );

        let result = adapter.generate(&memory, &last.content).await.map_err(|e| {
            error!(provider = %provider, error = %e, "generation failed");
            e
        })?;

        Ok(ChatResponse::from_result(result))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::types::ProviderExtras;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn orchestrator() -> ChatOrchestrator {
        ChatOrchestrator::new(Arc::new(Settings::default()))
    }

    fn hosted_request(api_base: &str, messages: Vec<Message>) -> ChatRequest {
        let mut request = ChatRequest::new(messages);
        request.model = Some("gpt-4o".to_string());
        request.extras = ProviderExtras {
            api_base: Some(api_base.to_string()),
            ..Default::default()
        };
        request
    }

    fn stub_reply(content: &str) -> serde_json::Value {
        serde_json::json!({"choices": [{"message": {"content": content}}]})
    }

    // ── replay_history ──

    #[test]
    fn test_replay_pairs_turns_in_order() {
        let mut memory = ConversationMemory::new();
        let history = vec![
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("How are you?"),
            Message::assistant("Great."),
        ];
        replay_history(&mut memory, &history).unwrap();

        let turns = memory.as_prompt_context();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].input, "Hi");
        assert_eq!(turns[0].output.as_deref(), Some("Hello!"));
        assert_eq!(turns[1].input, "How are you?");
        assert_eq!(turns[1].output.as_deref(), Some("Great."));
    }

    #[test]
    fn test_replay_dangling_reply_fails() {
        let mut memory = ConversationMemory::new();
        let history = vec![Message::assistant("I speak first!")];
        let err = replay_history(&mut memory, &history).unwrap_err();
        assert!(matches!(err, GatewayError::DanglingReply { position: 0 }));
    }

    #[test]
    fn test_replay_double_reply_fails() {
        let mut memory = ConversationMemory::new();
        let history = vec![
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::assistant("Hello again!"),
        ];
        let err = replay_history(&mut memory, &history).unwrap_err();
        assert!(matches!(err, GatewayError::DanglingReply { position: 2 }));
    }

    #[test]
    fn test_replay_system_anywhere_wins_last() {
        let mut memory = ConversationMemory::new();
        let history = vec![
            Message::system("Be formal."),
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::system("Be casual."),
        ];
        replay_history(&mut memory, &history).unwrap();
        assert_eq!(memory.system_instruction(), Some("Be casual."));
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_replay_consecutive_users_leave_turn_open() {
        let mut memory = ConversationMemory::new();
        let history = vec![Message::user("anyone?"), Message::user("hello?")];
        replay_history(&mut memory, &history).unwrap();

        let turns = memory.as_prompt_context();
        assert_eq!(turns.len(), 2);
        assert!(turns[0].output.is_none());
        assert!(turns[1].output.is_none());
    }

    // ── handle: end-to-end against a stub backend ──

    #[tokio::test]
    async fn test_handle_single_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stub_reply("Hello there!")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let request = hosted_request(&mock_server.uri(), vec![Message::user("Hi")]);
        let response = orchestrator()
            .handle(ProviderKind::OpenAi, request, Some("sk-test".to_string()))
            .await
            .unwrap();

        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.message.content, "Hello there!");
    }

    #[tokio::test]
    async fn test_handle_replays_one_completed_turn() {
        let mock_server = MockServer::start().await;

        // user+assistant history plus the final user message: exactly one
        // completed turn reaches the backend ahead of the new input.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello!"},
                    {"role": "user", "content": "How are you?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(stub_reply("Great.")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let request = hosted_request(
            &mock_server.uri(),
            vec![
                Message::user("Hi"),
                Message::assistant("Hello!"),
                Message::user("How are you?"),
            ],
        );
        let response = orchestrator()
            .handle(ProviderKind::OpenAi, request, Some("sk-test".to_string()))
            .await
            .unwrap();
        assert_eq!(response.message.content, "Great.");
    }

    #[tokio::test]
    async fn test_handle_llama_server_error_surfaces() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("out of memory"))
            .mount(&mock_server)
            .await;

        let mut request = ChatRequest::new(vec![Message::user("Hi")]);
        request.extras.server_url = Some(mock_server.uri());

        let err = orchestrator()
            .handle(ProviderKind::Llama, request, None)
            .await
            .unwrap_err();

        match err {
            GatewayError::ProviderCall { status, detail } => {
                assert_eq!(status, Some(500));
                assert!(detail.contains("out of memory"));
            }
            other => panic!("expected ProviderCall, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_rejects_invalid_request_before_any_call() {
        let mock_server = MockServer::start().await;
        // No mock mounted: a request reaching the server would 404

        let request = hosted_request(
            &mock_server.uri(),
            vec![Message::user("Hi"), Message::assistant("Hello!")],
        );
        let err = orchestrator()
            .handle(ProviderKind::OpenAi, request, Some("sk-test".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_credential_fallback_to_settings() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer sk-from-settings",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(stub_reply("ok")))
            .mount(&mock_server)
            .await;

        let mut settings = Settings::default();
        settings.providers.openai.api_key = "sk-from-settings".to_string();
        let orchestrator = ChatOrchestrator::new(Arc::new(settings));

        let request = hosted_request(&mock_server.uri(), vec![Message::user("Hi")]);
        let response = orchestrator
            .handle(ProviderKind::OpenAi, request, None)
            .await
            .unwrap();
        assert_eq!(response.message.content, "ok");
    }

    #[tokio::test]
    async fn test_handle_missing_credential_everywhere() {
        let request = hosted_request("http://127.0.0.1:1", vec![Message::user("Hi")]);
        let err = orchestrator()
            .handle(ProviderKind::OpenAi, request, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_share_state() {
        let mock_server = MockServer::start().await;

        // Each request must arrive with its own history, never the other's.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    {"role": "user", "content": "alpha"},
                    {"role": "assistant", "content": "alpha-reply"},
                    {"role": "user", "content": "alpha-next"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(stub_reply("from-alpha")))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    {"role": "user", "content": "beta"},
                    {"role": "assistant", "content": "beta-reply"},
                    {"role": "user", "content": "beta-next"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(stub_reply("from-beta")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let orchestrator = orchestrator();
        let alpha = hosted_request(
            &mock_server.uri(),
            vec![
                Message::user("alpha"),
                Message::assistant("alpha-reply"),
                Message::user("alpha-next"),
            ],
        );
        let beta = hosted_request(
            &mock_server.uri(),
            vec![
                Message::user("beta"),
                Message::assistant("beta-reply"),
                Message::user("beta-next"),
            ],
        );

        let (a, b) = tokio::join!(
            orchestrator.handle(ProviderKind::OpenAi, alpha, Some("sk-a".to_string())),
            orchestrator.handle(ProviderKind::OpenAi, beta, Some("sk-b".to_string())),
        );

        assert_eq!(a.unwrap().message.content, "from-alpha");
        assert_eq!(b.unwrap().message.content, "from-beta");
    }
}
