//! Corpus inspection entry point.
//!
//! Loads an annotation file and its grid index, validates that every index
//! entry resolves, and prints a summary together with the endpoints the grid
//! would talk to.
//!
//! Usage: `ballcurator <annotations.json> <index.json> [--config <path>] [--check-server]`
//!
//! With `--check-server` the first entry's full frame is fetched from the server to
//! check that it is reachable.

use std::path::PathBuf;
use std::process::ExitCode;

use ballcurator::config::AppConfig;
use ballcurator::keybindings::JumpTarget;
use ballcurator::remote::{Endpoints, HttpBackend, ImageRequest};
use ballcurator::telemetry::SessionId;
use ballcurator::{execute, AnnotationStore, Effect, Message};

struct Args {
    annotations: PathBuf,
    index: PathBuf,
    config: Option<PathBuf>,
    check_server: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut check_server = false;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--check-server" => check_server = true,
            "-h" | "--help" => {
                return Err(String::new());
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(annotations), Some(index), None) => Ok(Args {
            annotations,
            index,
            config,
            check_server,
        }),
        _ => Err("expected an annotation file and an index file".to_string()),
    }
}

fn init_logging(config: &AppConfig) {
    let default = config.preferences.log_level.to_level_filter().to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            if !e.is_empty() {
                eprintln!("error: {}", e);
            }
            eprintln!("usage: ballcurator <annotations.json> <index.json> [--config <path>] [--check-server]");
            return ExitCode::FAILURE;
        }
    };

    let config = AppConfig::load_or_default(args.config.as_deref());
    init_logging(&config);

    let store = match AnnotationStore::load(&args.annotations, &args.index) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to load corpus: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stats = store.stats();
    println!("{} entries across {} images", stats.entries, stats.images);
    println!("  removed: {}", stats.removed);
    println!("  cleared: {}", stats.cleared);

    for target in [JumpTarget::LastRemoved, JumpTarget::LastCleared] {
        match store.last_matching(|record| target.matches(record)) {
            Some(index) => println!("  last {}: #{}", target.name(), index),
            None => println!("  last {}: none", target.name()),
        }
    }

    let endpoints = match Endpoints::new(&config.server.base_url) {
        Ok(endpoints) => endpoints,
        Err(e) => {
            log::error!("Invalid server URL {:?}: {}", config.server.base_url, e);
            return ExitCode::FAILURE;
        }
    };
    println!("server: {}", endpoints.base());

    let transform = config.editor.transform();
    if let Some(entry) = store.entry(0) {
        let request = match store.display_circle(0) {
            Some(circle) => ImageRequest::cropped(entry.image_index, &circle, &transform),
            None => ImageRequest::full(entry.image_index),
        };
        match endpoints.image_url(&request) {
            Ok(url) => println!("  first thumbnail: {}", url),
            Err(e) => log::warn!("Could not build thumbnail URL: {}", e),
        }
    }
    if config.telemetry.enabled {
        if let Ok(url) = endpoints.telemetry_url(&SessionId::generate()) {
            println!("  telemetry: {}", url);
        }
    }

    if args.check_server {
        if let Some(entry) = store.entry(0) {
            return check_server(endpoints, &config, entry.image_index);
        }
    }

    ExitCode::SUCCESS
}

fn check_server(endpoints: Endpoints, config: &AppConfig, image_index: usize) -> ExitCode {
    let backend = match HttpBackend::new(endpoints, config.server.timeout()) {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("Could not create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let effect = Effect::FetchFullImage {
        index: 0,
        request: ImageRequest::full(image_index),
    };
    match execute(&backend, &effect) {
        Some(Message::FullImageLoaded { size, .. }) => {
            println!("  frame {}: {}x{}", image_index, size.width, size.height);
            ExitCode::SUCCESS
        }
        Some(Message::FullImageFailed { error, .. }) => {
            log::error!("Fetching frame {} failed: {}", image_index, error);
            ExitCode::FAILURE
        }
        _ => ExitCode::FAILURE,
    }
}
