//! CLI entrypoint for agora
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use agora_application::{DebateService, FlowServices, RunDebateUseCase, ServiceParams};
use agora_domain::{
    AgenticFlowConfiguration, DebateConfig, Model, NewParticipant, ParticipantType,
};
use agora_infrastructure::{
    CompositeEventPublisher, ConfigLoader, FileConfig, FileOutputFormat, InMemoryRepository,
    JsonlEventPublisher, KeywordRetriever, KnowledgeBase, LocalToolExecutor, ProviderGateway,
    ProviderRouter, ScriptedProvider, TracingEventPublisher,
};
use agora_presentation::{Cli, ConsoleFormatter, OutputFormat, ParticipantSpec, ProgressReporter};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Provider ids the scripted adapter answers for out of the box
const BUILTIN_PROVIDERS: [&str; 4] = ["anthropic", "openai", "google", "scripted"];

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    // Load configuration
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.file.as_deref())?;
    info!("Starting agora");

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            error!("Configuration: {}", issue);
        }
        bail!("Invalid configuration ({} issues)", issues.len());
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    let Some(topic) = cli.topic.clone() else {
        bail!("A debate topic is required. Use --show-config to inspect configuration.");
    };

    // === Dependency Injection ===
    let service = build_service(&config)?;
    let debate_config = debate_config(&cli, &config);
    let model = cli
        .model
        .clone()
        .unwrap_or_else(|| config.debate.default_model.clone());
    let specs = cli.participant_specs();

    let debate_id = service.create_debate(&topic, debate_config).await?;
    for spec in &specs {
        let participant = new_participant(spec, &cli, &config, model.clone());
        service
            .join_debate(debate_id, participant)
            .await
            .with_context(|| format!("Could not add participant {}", spec))?;
    }

    let output = cli.output.unwrap_or(match config.output.format {
        Some(FileOutputFormat::Summary) => OutputFormat::Summary,
        Some(FileOutputFormat::Json) => OutputFormat::Json,
        Some(FileOutputFormat::Full) | None => OutputFormat::Full,
    });

    // Print header
    if !cli.quiet && output != OutputFormat::Json {
        println!();
        println!("+============================================================+");
        println!("|                 Agora - Structured Debate                  |");
        println!("+============================================================+");
        println!();
        println!("Topic: {}", topic);
        println!(
            "Participants: {}",
            specs
                .iter()
                .map(|s| format!("{} ({})", s.name, s.position))
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("Model: {}", model);
        println!();
    }

    let use_case = RunDebateUseCase::new(service.clone());
    let result = if cli.quiet {
        use_case.execute(debate_id).await
    } else {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(debate_id, &progress).await
    };
    service.shutdown();
    let debate = result?;

    let rendered = match output {
        OutputFormat::Full => ConsoleFormatter::format(&debate),
        OutputFormat::Summary => ConsoleFormatter::format_summary(&debate),
        OutputFormat::Json => ConsoleFormatter::format_json(&debate),
    };
    println!("{}", rendered);

    Ok(())
}

/// stderr logging driven by `-v`, plus an optional plain-text log file
fn init_logging(verbose: u8, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match file {
        Some(path) => {
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("logging.file is not a file path: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create log directory {}", dir.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn build_service(config: &FileConfig) -> Result<Arc<DebateService>> {
    // Providers: every known id answers through the offline scripted adapter
    let mut scripted =
        ScriptedProvider::new().with_confidence(config.providers.scripted.confidence);
    if let Some(latency) = config.providers.scripted.latency() {
        scripted = scripted.with_latency(latency);
    }
    let scripted = Arc::new(scripted);
    let mut router = ProviderRouter::new().with_fallback(scripted.clone());
    let referenced = config.providers.referenced_providers();
    for id in BUILTIN_PROVIDERS
        .iter()
        .map(|id| id.to_string())
        .chain(referenced)
    {
        router = router.with_provider(id, scripted.clone());
    }
    info!(providers = ?router.provider_ids(), "Provider routes registered");
    let gateway = Arc::new(ProviderGateway::new(Arc::new(router), &config.gateway));

    // Knowledge for the tool-calling and retrieval flows
    let knowledge = match &config.flows.knowledge_dir {
        Some(dir) => KnowledgeBase::load_dir(dir)
            .with_context(|| format!("Could not load notes from {}", dir.display()))?,
        None => KnowledgeBase::new(),
    };
    info!(notes = knowledge.len(), "Knowledge base loaded");
    let knowledge = Arc::new(knowledge);
    let services = FlowServices {
        tools: Arc::new(LocalToolExecutor::new(knowledge.clone())),
        retrieval: Arc::new(KeywordRetriever::new(knowledge)),
    };

    // Events: tracing always, JSONL transcript when configured
    let mut events = CompositeEventPublisher::new().with(Arc::new(TracingEventPublisher::new()));
    if let Some(path) = &config.logging.events_file {
        match JsonlEventPublisher::new(path) {
            Some(publisher) => events = events.with(Arc::new(publisher)),
            None => warn!(path = %path.display(), "Event transcript disabled"),
        }
    }

    let repository = Arc::new(InMemoryRepository::new());
    let params = ServiceParams::default()
        .with_round_grace(config.flows.grace())
        .with_default_model(config.debate.default_model.clone())
        .with_max_turn_attempts(config.debate.max_turn_attempts)
        .with_flow_timeout(config.flows.timeout())
        .with_organization(config.providers.organization.clone());

    Ok(DebateService::builder(gateway)
        .with_flow_services(services)
        .with_persistence(repository.clone())
        .with_flow_repository(repository.clone())
        .with_execution_repository(repository)
        .with_events(Arc::new(events))
        .with_provider_config(config.providers.to_provider_config())
        .with_params(params)
        .build())
}

/// Configured debate defaults with command-line overrides applied
fn debate_config(cli: &Cli, config: &FileConfig) -> DebateConfig {
    let mut debate = config.debate.to_debate_config();
    if let Some(rounds) = cli.rounds {
        debate = debate.with_max_rounds(rounds);
    }
    if cli.balanced {
        debate = debate.with_balanced_positions(true);
    }
    if let Some(seconds) = cli.round_time {
        debate = debate.with_round_time_limit(Duration::from_secs(seconds));
    }
    debate
}

fn new_participant(
    spec: &ParticipantSpec,
    cli: &Cli,
    config: &FileConfig,
    model: Model,
) -> NewParticipant {
    let flow = spec.flow.or(cli.flow).map(|flow_type| {
        AgenticFlowConfiguration::new(flow_type).with_param("max_calls", config.flows.max_calls)
    });

    NewParticipant {
        name: spec.name.clone(),
        participant_type: ParticipantType::Ai,
        position: spec.position.as_str().into(),
        provider: None,
        model: Some(model),
        flow,
    }
}
