//! Wiring from configuration to a ready `ChatService`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use folio_config::{AuthSettings, Config, ProfileAccess, ProfileConfig, ProviderSettings, RoutingKind};
use folio_core::agent::defaults::render;
use folio_core::AgentRegistry;
use folio_llm::{LLMProvider, OpenAiProvider, ProviderConfig};
use folio_profile::{FetcherConfig, ProfileFetcher, ProfileTool};
use folio_router::{
    ChatService, ControllerSettings, ConversationController, KeywordGate, KeywordRouting, LlmCompletion,
    ModelRouting, ProfileMode, RoutingStrategy,
};
use folio_session::{SessionManager, SessionManagerConfig};
use folio_tool::{InMemoryToolRegistry, ToolExecutor, ToolRegistry};
use tracing::{info, warn};

pub struct App {
    pub service: ChatService,
    pub profile: Arc<ProfileFetcher>,
}

pub fn agent_registry(config: &Config) -> anyhow::Result<Arc<AgentRegistry>> {
    let registry = config.agents.registry().context("invalid agent configuration")?;
    Ok(Arc::new(registry))
}

/// Executor whose timeout outlasts every retry of the profile fetch
pub fn tool_executor(tools: InMemoryToolRegistry, profile: &ProfileConfig) -> ToolExecutor {
    ToolExecutor::new(Arc::new(tools)).with_timeout(fetcher_config(profile).tool_timeout())
}

pub fn profile_fetcher(profile: &ProfileConfig) -> anyhow::Result<Arc<ProfileFetcher>> {
    let fetcher = ProfileFetcher::http(&fetcher_config(profile))
        .with_context(|| format!("cannot build profile client for {}", profile.endpoint))?;
    Ok(Arc::new(fetcher))
}

pub fn fetcher_config(profile: &ProfileConfig) -> FetcherConfig {
    FetcherConfig {
        endpoint: profile.endpoint.clone(),
        max_attempts: profile.max_attempts,
        retry_delay: profile.retry_delay(),
        timeout: profile.timeout(),
    }
}

/// Provider settings plus the credential read from the environment
pub fn provider_config(name: &str, settings: &ProviderSettings) -> anyhow::Result<ProviderConfig> {
    let mut provider = ProviderConfig::new(name, settings.base_url.clone())
        .with_max_retries(settings.max_retries)
        .with_tool_calling(settings.tool_calling);

    if let Some(model) = &settings.model {
        provider = provider.with_model(model.clone());
    }
    if let Some(secs) = settings.timeout_seconds {
        provider = provider.with_timeout(Duration::from_secs(secs));
    }
    for (key, value) in settings.headers.iter().flatten() {
        provider = provider.with_header(key.clone(), value.clone());
    }

    provider = match &settings.auth {
        AuthSettings::ApiKey { env } => {
            let key = settings
                .auth
                .get_api_key()
                .filter(|k| !k.trim().is_empty())
                .with_context(|| format!("environment variable {} is not set", env))?;
            provider.with_api_key(key)
        }
        AuthSettings::Bearer { env } => {
            let token = settings
                .auth
                .get_bearer_token()
                .filter(|t| !t.trim().is_empty())
                .with_context(|| format!("environment variable {} is not set", env))?;
            provider.with_bearer_token(token)
        }
        AuthSettings::None => provider,
    };

    Ok(provider)
}

/// Fixed texts and limits for the controller; tool mode needs a provider that accepts tools
pub fn controller_settings(config: &Config, tool_calling: bool) -> ControllerSettings {
    let subject = &config.agents.subject;
    let profile_mode = match config.profile.mode {
        ProfileAccess::Tool if tool_calling => ProfileMode::Tool,
        ProfileAccess::Tool => {
            warn!("provider does not accept tool definitions, prefetching the profile instead");
            ProfileMode::Prefetch
        }
        ProfileAccess::Prefetch => ProfileMode::Prefetch,
    };

    ControllerSettings {
        greeting: render(&config.conversation.greeting, subject),
        refusal: render(&config.gate.refusal, subject),
        error_prefix: config.conversation.error_prefix.clone(),
        history_cap: config.conversation.history_cap,
        profile_mode,
    }
}

pub fn routing(kind: RoutingKind) -> Arc<dyn RoutingStrategy> {
    match kind {
        RoutingKind::Model => Arc::new(ModelRouting),
        RoutingKind::Keyword => Arc::new(KeywordRouting),
    }
}

pub fn session_manager(config: &Config) -> Arc<SessionManager> {
    let conversation = &config.conversation;
    Arc::new(SessionManager::new(
        SessionManagerConfig::default()
            .with_history_cap(conversation.history_cap)
            .with_idle_timeout(Duration::from_secs(conversation.idle_timeout_secs))
            .with_max_sessions(conversation.max_sessions),
    ))
}

pub async fn build(config: &Config) -> anyhow::Result<App> {
    let registry = agent_registry(config)?;
    let profile = profile_fetcher(&config.profile)?;

    let tools = InMemoryToolRegistry::new();
    tools.register(Arc::new(ProfileTool::new(profile.clone()))).await?;
    registry
        .check_tools(|name| tools.contains(name))
        .context("agent references a tool that is not registered")?;

    let name = &config.llm.default_provider;
    let settings = config
        .default_provider()
        .with_context(|| format!("provider '{}' is not configured", name))?;
    if !settings.enabled {
        bail!("provider '{}' is disabled", name);
    }
    let provider: Arc<dyn LLMProvider> = Arc::new(OpenAiProvider::with_config(provider_config(name, settings)?)?);
    let tool_calling = provider.metadata().capabilities.tool_calling;

    let completion = LlmCompletion::new(provider, Arc::new(tool_executor(tools, &config.profile)))
        .with_max_tool_rounds(config.conversation.max_tool_rounds);

    let controller = ConversationController::new(registry, Arc::new(completion))
        .with_gate(Arc::new(KeywordGate::new(&config.gate.keywords)))
        .with_routing(routing(config.agents.routing))
        .with_profile_source(profile.clone())
        .with_settings(controller_settings(config, tool_calling));

    info!(
        provider = %name,
        routing = %config.agents.routing,
        profile_mode = ?controller.settings().profile_mode,
        "chat service ready"
    );

    let sessions = session_manager(config);
    // 任务只持有弱引用，服务释放后自行退出
    let _ = sessions.spawn_cleanup();

    Ok(App {
        service: ChatService::new(Arc::new(controller), sessions),
        profile,
    })
}
