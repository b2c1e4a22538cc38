use anyhow::{Context, Result};
use crew_pipeline::cli::commands::{MarketingCommand, MemoryCommand, ResearchCommand, ValidateCommand};
use crew_pipeline::cli::output::*;
use crew_pipeline::cli::{Cli, Command};
use crew_pipeline::config::AppConfig;
use crew_pipeline::execution::{CancellationFlag, PipelineRunner, StepExecutor};
use crew_pipeline::model::{ModelInvoker, OpenAiClient};
use crew_pipeline::persistence::{LocalDocumentStore, VectorMemory};
use crew_pipeline::pipelines::{
    MarketingPipeline, MarketingRequest, ResearchPipeline, ResearchRequest,
};
use crew_pipeline::search::{TavilyClient, WebSearchClient};
use crew_pipeline::services::{ResearchOutcome, ResearchService};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match &cli.command {
        Command::Research(cmd) => research(cmd, &config).await?,
        Command::Marketing(cmd) => marketing(cmd, &config).await?,
        Command::Memory(cmd) => memory(cmd, &config).await?,
        Command::Validate(cmd) => validate(cmd, &config)?,
    }

    Ok(())
}

/// Build the runner shared by both pipelines
fn build_runner(config: &AppConfig) -> Result<PipelineRunner> {
    let client_config = config.model_client_config();
    if client_config.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; model calls will fail");
    }

    let client = Arc::new(
        OpenAiClient::new(client_config)
            .context("Failed to create model client")?
            .with_image_settings(config.image_settings()),
    );

    let mut executor = StepExecutor::new(ModelInvoker::new(client.clone(), config.model.timeout_secs));
    if config.image.enabled {
        executor = executor.with_image_generator(client);
    }

    // Ctrl-C stops the run before its next step
    let shutdown = CancellationFlag::new();
    let flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping after the current step");
            flag.cancel();
        }
    });

    let reporter = ProgressReporter::new();
    Ok(PipelineRunner::new(executor)
        .with_run_timeout(config.runner.timeout_secs)
        .with_shutdown(shutdown)
        .with_event_handler(move |event| reporter.handle(event)))
}

fn build_search(config: &AppConfig) -> Result<Option<Arc<dyn WebSearchClient>>> {
    if !config.search.enabled {
        return Ok(None);
    }

    let client = TavilyClient::from_env(config.search.timeout_secs)
        .context("Failed to create search client")?
        .with_endpoint(&config.search.endpoint);
    if !client.has_api_key() {
        warn!("TAVILY_API_KEY is not set; web search is disabled");
        return Ok(None);
    }
    Ok(Some(Arc::new(client)))
}

#[cfg(feature = "sqlite")]
async fn open_memory(config: &AppConfig) -> Result<Arc<dyn VectorMemory>> {
    let path = config.storage.memory_db();
    let memory = crew_pipeline::persistence::SqliteMemory::new(&path)
        .await
        .with_context(|| format!("Failed to open memory at {}", path.display()))?;
    Ok(Arc::new(memory))
}

#[cfg(not(feature = "sqlite"))]
async fn open_memory(_config: &AppConfig) -> Result<Arc<dyn VectorMemory>> {
    warn!("Built without sqlite; research memory lasts only for this process");
    Ok(Arc::new(crew_pipeline::persistence::InMemoryMemory::new()))
}

async fn research(cmd: &ResearchCommand, config: &AppConfig) -> Result<()> {
    let mut pipeline = ResearchPipeline::new(&config.pipelines)?;
    if !cmd.no_search {
        if let Some(search) = build_search(config)? {
            pipeline = pipeline.with_search(search);
        }
    }

    let mut request = ResearchRequest::new(&cmd.topic);
    if let Some(content) = cmd.content()? {
        request = request.with_content(content);
    }

    let mut service = ResearchService::new(pipeline, Arc::new(build_runner(config)?))
        .with_documents(Arc::new(LocalDocumentStore::new(config.storage.reports_dir())));
    match open_memory(config).await {
        Ok(memory) => service = service.with_memory(memory),
        Err(e) => warn!("Research memory unavailable: {:#}", e),
    }

    println!("{} Researching {}", INFO, style(&cmd.topic).bold());
    let outcome = match service.conduct(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("\n{} Research failed at step {}", CROSS, style(&e.step).red());
            println!("  {}", style(e.message()).red());
            std::process::exit(1);
        }
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_research_outcome(&outcome);
    }
    Ok(())
}

fn print_research_outcome(outcome: &ResearchOutcome) {
    println!("\n{}\n", outcome.report);

    match &outcome.document {
        Some(document) => println!("{} Report saved: {}", CHECK, style(&document.view_link).underlined()),
        None => println!("{} Report was not saved", WARN),
    }
    if let Some(id) = &outcome.memory_id {
        println!("{} Remembered as {}", INFO, style(id).dim());
    }

    if !outcome.related.is_empty() {
        println!("\n{} Related past research:", INFO);
        for (i, item) in outcome.related.iter().enumerate() {
            println!("  {}", format_memory_match(i + 1, item));
        }
    }
}

async fn marketing(cmd: &MarketingCommand, config: &AppConfig) -> Result<()> {
    let pipeline = MarketingPipeline::new(&config.pipelines)?;
    let runner = build_runner(config)?;

    let mut request = MarketingRequest::new(&cmd.topic, &cmd.platform).with_image(cmd.image);
    if let Some(context) = &cmd.context {
        request = request.with_context(context);
    }

    println!(
        "{} Generating content for {} on {}",
        INFO,
        style(&cmd.topic).bold(),
        style(&cmd.platform).cyan()
    );
    let content = match pipeline.run(&runner, &request).await {
        Ok(content) => content,
        Err(e) => {
            println!("\n{} Marketing failed at step {}", CROSS, style(&e.step).red());
            println!("  {}", style(e.message()).red());
            std::process::exit(1);
        }
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&content)?);
        return Ok(());
    }

    println!("\n{}\n{}", style("Ideas").bold(), content.ideas);
    println!("\n{}\n{}", style("Post").bold(), content.post_text);
    println!("\n{}\n{}", style("Image prompt").bold(), content.image_prompt);
    match &content.image_url {
        Some(url) => println!("\n{} Image: {}", CHECK, style(url).underlined()),
        None if cmd.image => println!("\n{} No image was generated", WARN),
        None => {}
    }
    Ok(())
}

async fn memory(cmd: &MemoryCommand, config: &AppConfig) -> Result<()> {
    let memory = open_memory(config).await?;
    let matches = memory.query(&cmd.query, cmd.top_k).await?;
    info!("Memory query returned {} matches", matches.len());

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("{} No related research found", INFO);
        return Ok(());
    }

    for (i, item) in matches.iter().enumerate() {
        println!("{}", format_memory_match(i + 1, item));
        println!("   {}", format_output(&item.document, 3).replace('\n', "\n   "));
    }
    Ok(())
}

fn validate(cmd: &ValidateCommand, config: &AppConfig) -> Result<()> {
    println!("{} Validating configuration...", INFO);

    let research = ResearchPipeline::new(&config.pipelines)?;
    let marketing = MarketingPipeline::new(&config.pipelines)?.spec(config.image.enabled)?;

    if cmd.json {
        let describe = |spec: &crew_pipeline::core::PipelineSpec| {
            let steps: Vec<_> = spec
                .steps()
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "name": s.name,
                        "depends_on": s.depends_on,
                        "model": s.model_params,
                    })
                })
                .collect();
            serde_json::json!({ "name": spec.name(), "steps": steps })
        };
        let data = serde_json::json!({
            "config": config,
            "pipelines": [describe(research.spec()), describe(&marketing)],
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Configuration is valid!", CHECK);
    for spec in [research.spec(), &marketing] {
        println!("  {}", style(spec.name()).bold());
        for step in spec.steps() {
            let deps = if step.depends_on.is_empty() {
                String::new()
            } else {
                format!(" <- {}", step.depends_on.join(", "))
            };
            println!(
                "    {}{} {}",
                style(&step.name).cyan(),
                style(deps).dim(),
                style(format!(
                    "({}, t={}, max={})",
                    step.model_params.model_id,
                    step.model_params.temperature,
                    step.model_params.max_output_tokens
                ))
                .dim()
            );
        }
    }
    Ok(())
}
