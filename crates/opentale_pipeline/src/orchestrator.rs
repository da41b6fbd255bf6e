//! Request assembly and response post-processing for every stage.

use crate::catalog::PromptCatalog;
use crate::extraction;
use opentale_core::{
    ChatMessage, ContextSnapshot, GenerationParams, GenerationRequest, StageIdentifier,
};
use opentale_error::{BuilderError, OpentaleResult};
use opentale_interface::{ChunkStream, GenerationService, Streaming};
use tracing::{debug, error, info, instrument};

/// Builds stage requests from the catalog and a snapshot, dispatches them,
/// and extracts the usable part of the reply.
///
/// # Examples
///
/// ```
/// use opentale_core::{ContextSnapshot, StageIdentifier};
/// use opentale_pipeline::StageOrchestrator;
///
/// let orchestrator = StageOrchestrator::default();
/// let snapshot = ContextSnapshot::default();
///
/// let request = orchestrator
///     .build(StageIdentifier::WorldBuilder, &snapshot, &[], "A city under the sea")
///     .unwrap();
/// assert_eq!(request.conversation().len(), 2);
///
/// // Characters need a world first.
/// assert!(orchestrator
///     .build(StageIdentifier::CharacterGenerator, &snapshot, &[], "Three heroes")
///     .is_err());
/// ```
#[derive(Debug, Clone, Default, derive_getters::Getters)]
pub struct StageOrchestrator {
    /// System prompt templates
    catalog: PromptCatalog,
    /// Parameters for requests that do not override them
    defaults: GenerationParams,
}

impl StageOrchestrator {
    /// Orchestrator over `catalog`, sending `defaults` with every request.
    pub fn new(catalog: PromptCatalog, defaults: GenerationParams) -> Self {
        Self { catalog, defaults }
    }

    /// Assemble the request for `stage`.
    ///
    /// The rendered template becomes the system prompt, `history` follows in
    /// order, and `user_turn` is the final user message.
    ///
    /// # Errors
    ///
    /// `MissingPrerequisiteError` if the snapshot lacks a slot the stage
    /// depends on, `ConfigurationError` if the template cannot be rendered.
    #[instrument(skip(self, context, history, user_turn), fields(history = history.len()))]
    pub fn build(
        &self,
        stage: StageIdentifier,
        context: &ContextSnapshot,
        history: &[ChatMessage],
        user_turn: &str,
    ) -> OpentaleResult<GenerationRequest> {
        context.check_prerequisites(stage)?;
        let system_prompt = self.catalog.render(stage, context)?;

        let request = GenerationRequest::builder()
            .stage(stage)
            .context(context.clone())
            .system_prompt(system_prompt)
            .history(history.to_vec())
            .user_turn(user_turn)
            .params(self.defaults.clone())
            .build()
            .map_err(|e| BuilderError::incomplete("generation request", e))?;

        debug!(
            system_len = request.system_prompt().len(),
            user_len = user_turn.len(),
            "Built stage request"
        );
        Ok(request)
    }

    /// Assemble the request for a stage identified by name.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if `stage` is not a known stage identifier.
    pub fn build_named(
        &self,
        stage: &str,
        context: &ContextSnapshot,
        history: &[ChatMessage],
        user_turn: &str,
    ) -> OpentaleResult<GenerationRequest> {
        let stage: StageIdentifier = stage.parse()?;
        self.build(stage, context, history, user_turn)
    }

    /// Apply the extraction rule of `stage`.
    pub fn extract(&self, stage: StageIdentifier, raw: &str) -> String {
        extraction::extract(stage, raw)
    }

    /// Dispatch a request and extract the reply.
    pub async fn run<S: GenerationService + ?Sized>(
        &self,
        service: &S,
        request: &GenerationRequest,
    ) -> OpentaleResult<String> {
        let raw = self.run_verbatim(service, request).await?;
        Ok(self.extract(*request.stage(), &raw))
    }

    /// Dispatch a request and return the reply untouched.
    #[instrument(
        skip(self, service, request),
        fields(stage = %request.stage(), model = service.model_name())
    )]
    pub async fn run_verbatim<S: GenerationService + ?Sized>(
        &self,
        service: &S,
        request: &GenerationRequest,
    ) -> OpentaleResult<String> {
        let reply = service
            .complete(request.system_prompt(), &request.messages(), request.params())
            .await
            .inspect_err(|e| error!(error = %e, "Generation failed"))?;
        info!(len = reply.len(), "Stage completed");
        Ok(reply)
    }

    /// Open a streaming call for a request.
    #[instrument(
        skip(self, service, request),
        fields(stage = %request.stage(), model = service.model_name())
    )]
    pub async fn open_stream<S: Streaming + ?Sized>(
        &self,
        service: &S,
        request: &GenerationRequest,
    ) -> OpentaleResult<ChunkStream> {
        service
            .stream(request.system_prompt(), &request.messages(), request.params())
            .await
            .inspect_err(|e| error!(error = %e, "Failed to open stream"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentale_core::Role;
    use opentale_error::OpentaleErrorKind;

    fn ready_for_outline() -> ContextSnapshot {
        let mut snapshot = ContextSnapshot::default();
        snapshot.set_chapter_count(5);
        snapshot.set_world_theme("WORLD_ELEMENTS:\n\nSalt flats.");
        snapshot.set_characters("CHARACTER_PROFILES:\n\nIdris.");
        snapshot
    }

    #[test]
    fn history_is_replayed_in_order_before_user_turn() {
        let history = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("second"),
            ChatMessage::user("third"),
            ChatMessage::assistant("fourth"),
        ];
        let request = StageOrchestrator::default()
            .build(
                StageIdentifier::OutlineCreatorChat,
                &ready_for_outline(),
                &history,
                "fifth",
            )
            .unwrap();

        let conversation = request.conversation();
        assert_eq!(conversation[0].role, Role::System);
        let contents: Vec<_> = conversation[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third", "fourth", "fifth"]);
        assert_eq!(conversation[5].role, Role::User);
    }

    #[test]
    fn system_prompt_is_rendered_from_snapshot() {
        let request = StageOrchestrator::default()
            .build(StageIdentifier::OutlineCreator, &ready_for_outline(), &[], "go")
            .unwrap();
        assert!(request.system_prompt().contains("EXACTLY 5 chapters"));
        assert!(request.system_prompt().contains("Salt flats."));
        assert!(request.system_prompt().contains("Idris."));
    }

    #[test]
    fn missing_characters_blocks_outline() {
        let mut snapshot = ContextSnapshot::default();
        snapshot.set_world_theme("WORLD_ELEMENTS:\n\nSalt flats.");
        let err = StageOrchestrator::default()
            .build(StageIdentifier::OutlineCreator, &snapshot, &[], "go")
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            OpentaleErrorKind::MissingPrerequisite(_)
        ));
    }

    #[test]
    fn unknown_stage_name_is_configuration_error() {
        let err = StageOrchestrator::default()
            .build_named("poet", &ContextSnapshot::default(), &[], "go")
            .unwrap_err();
        assert!(matches!(err.kind(), OpentaleErrorKind::Configuration(_)));
    }

    #[test]
    fn requests_carry_default_params() {
        let defaults = GenerationParams::builder()
            .temperature(0.3)
            .max_tokens(1200u32)
            .build()
            .unwrap();
        let request = StageOrchestrator::new(PromptCatalog::default(), defaults.clone())
            .build(StageIdentifier::WorldBuilder, &ContextSnapshot::default(), &[], "x")
            .unwrap();
        assert_eq!(request.params(), &defaults);
        assert!(!*request.streaming());
    }
}
