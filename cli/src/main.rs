//! CLI entrypoint for crewtalk
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use crewtalk_application::{
    Broadcaster, ConversationLogger, EnginePorts, ManageSessionUseCase, NoConversationLogger,
    SessionCoordinator, SessionQueryUseCase,
};
use crewtalk_domain::{
    AgentRole, MIN_TOTAL_SECS, NewAgent, NewSession, SessionEvent, SessionStatus,
};
use crewtalk_infrastructure::{
    ConfigLoader, FileConfig, InMemoryMemoryStore, InMemoryScratchpad, InMemorySessionRepository,
    JsonlConversationLogger, OllamaGateway,
};
use crewtalk_presentation::{Cli, ConsoleRenderer, OutputFormat, TurnSpinner};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    if let Some(model) = &cli.model {
        config.llm.default_model = model.clone();
    }
    config.validate()?;

    info!("Starting crewtalk");

    let problem = match cli.problem.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => bail!("A problem statement is required. Run with --help for usage."),
    };
    if cli.participants.is_empty() {
        bail!("At least one participant is required (-p NAME[:TRAIT[:MODEL]])");
    }

    let time_limit = cli.time_limit.unwrap_or(config.session.time_limit_sec);
    if time_limit < MIN_TOTAL_SECS {
        warn!(time_limit, "Time limit below {}s, phases use {}s", MIN_TOTAL_SECS, MIN_TOTAL_SECS);
    }

    // === Dependency Injection ===
    let gateway = Arc::new(OllamaGateway::new(
        config.llm.endpoint.clone(),
        config.request_timeout(),
    )?);
    match gateway.list_models().await {
        Ok(models) => info!(endpoint = %gateway.endpoint(), models = models.len(), "Model server reachable"),
        Err(e) => bail!(
            "Cannot reach the model server at {}: {}. Is Ollama running?",
            gateway.endpoint(),
            e
        ),
    }

    let ports = EnginePorts {
        repository: Arc::new(InMemorySessionRepository::new()),
        scratchpad: Arc::new(InMemoryScratchpad::new()),
        memory: Arc::new(InMemoryMemoryStore::new()),
        gateway,
        broadcaster: Arc::new(Broadcaster::new()),
        logger: transcript_logger(&config),
    };
    let engine_config = config.engine_config();
    let manage = ManageSessionUseCase::new(&ports, engine_config.clone());
    let query = SessionQueryUseCase::new(&ports);
    let coordinator = SessionCoordinator::new(ports.clone(), engine_config);

    let chatty = cli.output != OutputFormat::Json && !cli.quiet;

    let session = manage
        .create_session(
            NewSession::new(cli.session_title(&problem), problem.clone())
                .with_time_limit(time_limit)
                .with_strategy(config.session.strategy.clone()),
        )
        .await?;

    let mut renderer = ConsoleRenderer::new(cli.output);
    let mut line_up = vec![NewAgent::new(&session.id, &cli.moderator, AgentRole::Moderator)];
    for spec in &cli.participants {
        let mut agent = NewAgent::new(&session.id, &spec.name, AgentRole::Participant);
        if let Some(trait_tag) = &spec.trait_tag {
            agent = agent.with_trait(trait_tag);
        }
        if let Some(model) = &spec.model {
            agent = agent.with_model_hint(model);
        }
        line_up.push(agent);
    }
    if let Some(name) = &cli.notetaker {
        line_up.push(NewAgent::new(&session.id, name, AgentRole::Notetaker));
    }

    for new_agent in line_up {
        let admitted = manage.add_agent(new_agent).await?;
        if chatty {
            println!(
                "Admitted {} ({}): {}",
                admitted.agent.name,
                admitted.agent.role,
                admitted.probe_excerpt.trim()
            );
        }
        renderer.register(&admitted.agent);
    }

    let mut feed = query.subscribe(&session.id).await?;
    coordinator.start(&session.id).await?;

    let mut spinner = TurnSpinner::new(chatty && cli.output == OutputFormat::Live);
    let mut stopping = false;
    loop {
        let envelope = tokio::select! {
            envelope = feed.next() => envelope,
            signal = tokio::signal::ctrl_c(), if !stopping => {
                signal?;
                stopping = true;
                spinner.clear();
                if chatty {
                    println!("\nStopping session...");
                }
                coordinator.stop(&session.id).await?;
                continue;
            }
        };
        let Some(envelope) = envelope else {
            break;
        };

        spinner.observe(&envelope);
        if let Some(text) = renderer.render(&envelope) {
            print!("{}", text);
            std::io::stdout().flush()?;
        }

        let finished = matches!(
            &envelope.event,
            SessionEvent::SessionStatus(snapshot) if snapshot.status == SessionStatus::Done
        );
        if finished {
            if let Some(engine) = coordinator.engine(&session.id) {
                engine.wait_finished().await;
            }
            // Flush what the scheduler emitted while winding down, then end
            // the stream.
            ports.broadcaster.close_session(&session.id);
        }
    }
    spinner.clear();

    let export = query.export(&session.id).await?;
    if cli.output == OutputFormat::Json {
        println!("{}", serde_json::to_string(&export)?);
    } else {
        println!("{}", ConsoleRenderer::summary(&export));
    }

    Ok(())
}

fn transcript_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let Some(dir) = config.logging.transcript_dir.as_deref() else {
        return Arc::new(NoConversationLogger);
    };
    match JsonlConversationLogger::in_dir(dir) {
        Some(logger) => {
            info!(path = %logger.path().display(), "Writing session transcript");
            Arc::new(logger)
        }
        None => {
            warn!(dir, "Transcript directory unusable, transcripts disabled");
            Arc::new(NoConversationLogger)
        }
    }
}
