use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::apparel::{ApparelCatalog, DEFAULT_MAX_EXAMPLES};
use super::dto::{AdvisorRequest, AdvisorResponse, AdvisorResult};
use super::error::AdvisorError;
use super::extract::ChatCompletion;
use super::parse::parse_json_object;
use super::prompt::{compose, with_inline_image};
use super::provider::{ChatProvider, ChatRequest, ProviderReply};
use super::repo;
use crate::config::AdvisorConfig;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AdvisorSettings {
    pub model: String,
    pub fallback_model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&AdvisorConfig> for AdvisorSettings {
    fn from(cfg: &AdvisorConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            fallback_model: cfg.fallback_model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        }
    }
}

impl AdvisorSettings {
    fn distinct_fallback(&self) -> Option<&str> {
        self.fallback_model
            .as_deref()
            .filter(|m| !m.is_empty() && *m != self.model)
    }
}

/// Evaluates the outfit and stores the verdict for the user.
///
/// Storage is best effort: a failed insert is logged and the verdict is still
/// returned, just without an `id`.
#[instrument(skip(st, req))]
pub async fn analyze_outfit(
    st: &AppState,
    user_id: Uuid,
    req: AdvisorRequest,
) -> Result<AdvisorResponse, AdvisorError> {
    if !st.apparel.is_loaded() {
        st.apparel.clone().preload().await;
    }
    let settings = AdvisorSettings::from(&st.config.advisor);
    let result = evaluate_outfit(st.chat.as_ref(), &settings, &st.apparel, &req).await?;

    let id = match repo::insert_advice(&st.db, user_id, &req, &result).await {
        Ok(id) => {
            info!(%user_id, advice_id = %id, "outfit advice persisted");
            Some(id)
        }
        Err(e) => {
            error!(error = %e, %user_id, "failed to persist outfit advice");
            None
        }
    };

    Ok(AdvisorResponse { result, id })
}

/// Prompt, call with retries, then extract/parse/normalise. Never fails on
/// malformed model output, only when no provider call succeeds.
pub async fn evaluate_outfit(
    provider: &dyn ChatProvider,
    settings: &AdvisorSettings,
    catalog: &ApparelCatalog,
    req: &AdvisorRequest,
) -> Result<AdvisorResult, AdvisorError> {
    let context = catalog.build_context(req, DEFAULT_MAX_EXAMPLES);
    let prompt = compose(req, context.as_deref());
    let body = call_with_fallbacks(provider, settings, &prompt, req.image_url.as_deref()).await?;

    let text = ChatCompletion::from_body(&body).first_text();
    let parsed = text.as_deref().and_then(parse_json_object);
    if parsed.is_none() {
        warn!("advisor reply had no parseable JSON object");
    }
    Ok(AdvisorResult::from_parsed(parsed.as_ref()))
}

type Attempt = anyhow::Result<ProviderReply>;

fn failed(attempt: &Attempt) -> bool {
    match attempt {
        Ok(reply) => reply.is_error(),
        Err(_) => true,
    }
}

async fn attempt(provider: &dyn ChatProvider, request: &ChatRequest, stage: &str) -> Attempt {
    info!(model = %request.model, stage, "calling advisor provider");
    let res = provider.chat_completion(request).await;
    match &res {
        Ok(reply) if reply.is_error() => {
            warn!(status = reply.status, body = %reply.body, stage, "provider returned error")
        }
        Err(e) => warn!(error = %e, stage, "provider call failed"),
        Ok(_) => {}
    }
    res
}

/// Primary model, then the same model with the image inlined as text, then
/// the fallback model with the original body.
async fn call_with_fallbacks(
    provider: &dyn ChatProvider,
    settings: &AdvisorSettings,
    prompt: &str,
    image_url: Option<&str>,
) -> Result<Value, AdvisorError> {
    let original = ChatRequest::user_prompt(
        &settings.model,
        prompt.to_string(),
        image_url,
        settings.max_tokens,
        settings.temperature,
    );

    let mut outcome = attempt(provider, &original, "primary").await;

    if failed(&outcome) {
        let inlined = ChatRequest::user_prompt(
            &settings.model,
            with_inline_image(prompt, image_url),
            None,
            settings.max_tokens,
            settings.temperature,
        );
        outcome = attempt(provider, &inlined, "inline_image").await;
    }

    if failed(&outcome) {
        if let Some(fallback) = settings.distinct_fallback() {
            outcome = attempt(provider, &original.with_model(fallback), "fallback_model").await;
        }
    }

    match outcome {
        Ok(reply) if reply.status == 200 => Ok(reply.body),
        Ok(reply) => {
            error!(status = reply.status, body = %reply.body, "final provider error");
            Err(AdvisorError::Upstream {
                status: Some(reply.status),
                body: reply.body,
            })
        }
        Err(e) => {
            error!(error = %e, "no response from provider");
            Err(AdvisorError::Upstream {
                status: None,
                body: json!({ "error": format!("no response from provider: {}", e) }),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::apparel::ApparelRecord;
    use crate::advisor::provider::RequestPart;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned outcomes and records every request it receives.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Attempt>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Attempt>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<ChatRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn chat_completion(&self, request: &ChatRequest) -> anyhow::Result<ProviderReply> {
            self.seen.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
        }
    }

    fn reply(status: u16, body: Value) -> Attempt {
        Ok(ProviderReply { status, body })
    }

    fn ok_text(text: &str) -> Attempt {
        reply(200, json!({"choices": [{"message": {"role": "assistant", "content": text}}]}))
    }

    fn settings(fallback: Option<&str>) -> AdvisorSettings {
        AdvisorSettings {
            model: "primary-model".into(),
            fallback_model: fallback.map(str::to_string),
            max_tokens: 512,
            temperature: 0.2,
        }
    }

    fn request() -> AdvisorRequest {
        AdvisorRequest {
            outfit_type: Some("shirt".into()),
            outfit_season: Some("summer".into()),
            image_url: Some("https://cdn.example.com/look.png".into()),
            ..Default::default()
        }
    }

    fn prompt_text(req: &ChatRequest) -> &str {
        match &req.messages[0].content[0] {
            RequestPart::Text { text } => text,
            other => panic!("expected text part, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn happy_path_parses_and_normalizes() {
        let provider = ScriptedProvider::new(vec![ok_text(
            "Here you go: {\"score\": \"85\", \"suggestions\": [\"add a belt\", \"roll sleeves\"], \"recommendation\": \"recommended\"}",
        )]);
        let result = evaluate_outfit(&provider, &settings(None), &ApparelCatalog::empty(), &request())
            .await
            .unwrap();
        assert_eq!(result.suitability_score, Some(85));
        assert_eq!(result.improvement_suggestions.as_deref(), Some("add a belt, roll sleeves"));
        assert_eq!(result.recommendation.as_deref(), Some("recommended"));

        let seen = provider.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "primary-model");
        assert!(seen[0].has_image_part());
    }

    #[tokio::test]
    async fn unparseable_reply_degrades_to_null_result() {
        let provider = ScriptedProvider::new(vec![ok_text("I love it!")]);
        let result = evaluate_outfit(&provider, &settings(None), &ApparelCatalog::empty(), &request())
            .await
            .unwrap();
        assert_eq!(result, AdvisorResult::default());
    }

    #[tokio::test]
    async fn client_error_retries_with_inlined_image_then_fallback_with_original_body() {
        let provider = ScriptedProvider::new(vec![
            reply(400, json!({"error": "image parts unsupported"})),
            reply(400, json!({"error": "still failing"})),
            ok_text("{\"suitability_score\": 64}"),
        ]);
        let result = evaluate_outfit(
            &provider,
            &settings(Some("fallback-model")),
            &ApparelCatalog::empty(),
            &request(),
        )
        .await
        .unwrap();
        assert_eq!(result.suitability_score, Some(64));

        let seen = provider.seen();
        assert_eq!(seen.len(), 3);

        let (primary, inline, fallback) = (&seen[0], &seen[1], &seen[2]);
        assert_eq!(inline.model, "primary-model");
        assert!(!inline.has_image_part());
        assert_eq!(
            prompt_text(inline),
            format!("{}\nImage URL: https://cdn.example.com/look.png", prompt_text(primary))
        );

        assert_eq!(fallback.model, "fallback-model");
        assert!(fallback.has_image_part());
        assert_eq!(fallback.messages, primary.messages);
    }

    #[tokio::test]
    async fn transport_failure_triggers_the_inline_retry() {
        let provider = ScriptedProvider::new(vec![
            Err(anyhow::anyhow!("connection reset")),
            ok_text("{\"score\": 50}"),
        ]);
        let result = evaluate_outfit(&provider, &settings(None), &ApparelCatalog::empty(), &request())
            .await
            .unwrap();
        assert_eq!(result.suitability_score, Some(50));
        assert_eq!(provider.seen().len(), 2);
    }

    #[tokio::test]
    async fn fallback_is_skipped_when_it_equals_primary() {
        let provider = ScriptedProvider::new(vec![
            reply(500, json!({"error": "boom"})),
            reply(503, json!({"error": "overloaded"})),
        ]);
        let err = evaluate_outfit(
            &provider,
            &settings(Some("primary-model")),
            &ApparelCatalog::empty(),
            &request(),
        )
        .await
        .unwrap_err();
        assert_eq!(provider.seen().len(), 2);
        match err {
            AdvisorError::Upstream { status, body } => {
                assert_eq!(status, Some(503));
                assert_eq!(body, json!({"error": "overloaded"}));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn exhausted_ladder_reports_upstream_error() {
        let provider = ScriptedProvider::new(vec![
            Err(anyhow::anyhow!("timeout")),
            Err(anyhow::anyhow!("timeout")),
            Err(anyhow::anyhow!("timeout")),
        ]);
        let err = evaluate_outfit(
            &provider,
            &settings(Some("fallback-model")),
            &ApparelCatalog::empty(),
            &request(),
        )
        .await
        .unwrap_err();
        assert_eq!(provider.seen().len(), 3);
        assert!(matches!(err, AdvisorError::Upstream { status: None, .. }));
    }

    #[tokio::test]
    async fn non_200_success_status_is_not_retried_but_still_fails() {
        let provider = ScriptedProvider::new(vec![reply(202, json!({"queued": true}))]);
        let err = evaluate_outfit(&provider, &settings(Some("fb")), &ApparelCatalog::empty(), &request())
            .await
            .unwrap_err();
        assert_eq!(provider.seen().len(), 1);
        assert!(matches!(err, AdvisorError::Upstream { status: Some(202), .. }));
    }

    #[tokio::test]
    async fn reference_context_is_injected_into_prompt() {
        let catalog = ApparelCatalog::from_records(vec![
            ApparelRecord {
                article_type: "Shirt".into(),
                base_colour: "Blue".into(),
                display_name: "Oxford Blue Shirt".into(),
                ..Default::default()
            },
            ApparelRecord {
                article_type: "Jeans".into(),
                display_name: "Slim Jeans".into(),
                ..Default::default()
            },
        ]);
        let provider = ScriptedProvider::new(vec![ok_text("{}")]);
        evaluate_outfit(&provider, &settings(None), &catalog, &request())
            .await
            .unwrap();
        let seen = provider.seen();
        let prompt = prompt_text(&seen[0]);
        assert!(prompt.contains(
            "REFERENCE DATA: Items similar to 'shirt' — colors: Blue; examples: Oxford Blue Shirt\n\nOUTFIT DETAILS:"
        ));
    }

    #[tokio::test]
    async fn analyze_returns_result_even_when_persisting_fails() {
        let state = AppState::fake_with_chat(std::sync::Arc::new(ScriptedProvider::new(vec![
            ok_text("{\"score\": 90, \"recommendation\": \"recommended\"}"),
        ])));
        let resp = analyze_outfit(&state, Uuid::new_v4(), request()).await.unwrap();
        assert_eq!(resp.result.suitability_score, Some(90));
        assert_eq!(resp.id, None);
    }
}
