use doe_match::config::Settings;
use doe_match::models::{SearchCriteria, SearchOptions, SourceId};
use doe_match::services::{
    sample_source, JsonFileSource, ProviderRegistry, SearchCoordinator, StaticSource,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: doe-match <criteria.json> [source ...]\n       doe-match --case <source> <case-id>";

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let loaded = Settings::load();
    let settings = loaded.as_ref().cloned().unwrap_or_default();
    init_tracing(&settings);

    if let Err(e) = &loaded {
        error!("Failed to load configuration: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting doe-match search...");

    let mut args = std::env::args().skip(1);
    let Some(criteria_path) = args.next() else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    let options = match settings.search_options() {
        Ok(options) => options,
        Err(e) => {
            error!("Invalid search settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let coordinator = SearchCoordinator::new(build_registry(&settings));
    info!(
        "Registered sources: {:?} ({} available)",
        coordinator.registry(),
        coordinator.registry().available().len()
    );

    if criteria_path == "--case" {
        let (Some(source), Some(case_id)) = (args.next(), args.next()) else {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        };
        return lookup_case(&coordinator, &SourceId::new(source), &case_id, &options).await;
    }
    let selected: Vec<SourceId> = args.map(SourceId::new).collect();

    let criteria = match read_criteria(&criteria_path).await {
        Ok(criteria) => criteria,
        Err(e) => {
            error!("Failed to read criteria from {}: {}", criteria_path, e);
            return ExitCode::FAILURE;
        }
    };

    // Ctrl-C aborts in-flight fetches
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling search");
            signal_token.cancel();
        }
    });

    let outcome = match coordinator
        .search_with_cancel(&criteria, &selected, &options, &cancel)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Search failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for result in &outcome.results {
        info!(
            "{} {}/{}",
            result.summary_line(),
            result.record.source,
            result.record.case_id
        );
    }

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize results: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if outcome.summary.all_sources_failed() {
        error!("No source could be searched");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn lookup_case(
    coordinator: &SearchCoordinator,
    source: &SourceId,
    case_id: &str,
    options: &SearchOptions,
) -> ExitCode {
    let record = match coordinator.get_record(source, case_id, options).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            error!("Case {} not found in {}", case_id, source);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("Lookup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&record) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize record: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

async fn read_criteria(path: &str) -> Result<SearchCriteria, Box<dyn std::error::Error>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

fn build_registry(settings: &Settings) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    for source in settings.enabled_sources() {
        info!("Registering {} from {}", source.id, source.path.display());
        registry.register(Arc::new(JsonFileSource::new(source.id.clone(), source.path.clone())));
    }

    if registry.is_empty() {
        info!("No sources configured, using built-in sample records");
        registry.register(Arc::new(sample_source()));
    }

    // Listed so it can be selected, reported as failed until integrated
    registry.register(Arc::new(StaticSource::unavailable("FBIJaneDoe")));

    registry
}
