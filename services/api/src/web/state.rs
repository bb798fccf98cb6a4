//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and how the query engine is wired up.

use crate::adapters::{OpenAiSynthesizerAdapter, UnavailableSynthesizer};
use crate::config::{Config, SynthesizerMode};
use async_openai::{config::OpenAIConfig, Client};
use std::sync::Arc;
use tracing::info;
use workspace_query_core::{
    AnswerSynthesizer, MockSynthesizer, QueryEngine, StaticWorkspace, WorkspaceStore,
};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<QueryEngine>,
}

impl AppState {
    /// Builds the engine over the demo workspace, choosing the synthesizer from `config`.
    pub fn new(config: Arc<Config>) -> Self {
        let store: Arc<dyn WorkspaceStore> = Arc::new(StaticWorkspace::demo());
        let synthesizer = build_synthesizer(&config, store.clone());
        let engine = Arc::new(QueryEngine::new(store, synthesizer, config.timing));
        Self { config, engine }
    }
}

/// Selects the answer synthesizer for the configured mode.
///
/// Delegated mode without a credential degrades to a synthesizer that reports
/// itself unavailable on every call.
pub fn build_synthesizer(
    config: &Config,
    store: Arc<dyn WorkspaceStore>,
) -> Arc<dyn AnswerSynthesizer> {
    match config.synthesizer_mode {
        SynthesizerMode::Mock => {
            info!("Using the mock answer synthesizer.");
            Arc::new(MockSynthesizer::new(store))
        }
        SynthesizerMode::Delegated => match &config.openai_api_key {
            Some(api_key) => {
                info!("Using the OpenAI answer synthesizer ({}).", config.synth_model);
                let openai_config = OpenAIConfig::new().with_api_key(api_key);
                Arc::new(OpenAiSynthesizerAdapter::new(
                    Client::with_config(openai_config),
                    config.synth_model.clone(),
                ))
            }
            None => Arc::new(UnavailableSynthesizer::new(
                "OPENAI_API_KEY is not set; delegated answers are disabled",
            )),
        },
    }
}
