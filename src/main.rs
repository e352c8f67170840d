use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use image_preloader::application::services::{
    CacheIndex, PreloadCallbacks, PreloadCoordinator, PreloadScope, ScopeInput,
};
use image_preloader::infrastructure::{
    CliArgs, DiskCacheStore, HttpMediaFetcher, ImageMediaDecoder, PreloadConfig,
};

fn init_logging(config: &PreloadConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

async fn build_scope(config: &PreloadConfig) -> Result<PreloadScope> {
    let store = match &config.cache_dir {
        Some(dir) => Arc::new(DiskCacheStore::open(dir.clone(), config.max_store_bytes).await?),
        None => Arc::new(DiskCacheStore::default_location().await?),
    };
    let cache = Arc::new(CacheIndex::new(store));
    let fetcher = Arc::new(HttpMediaFetcher::new(config.timeout_secs)?);
    let decoder = Arc::new(ImageMediaDecoder::new(config.timeout_secs)?);

    let coordinator = Arc::new(
        PreloadCoordinator::new(cache, fetcher, decoder).with_profile(config.profile),
    );
    Ok(PreloadScope::new(coordinator))
}

fn read_input(config: &PreloadConfig) -> Result<ScopeInput> {
    let data = match &config.data_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Some(serde_json::from_str(&raw)?)
        }
        None => None,
    };
    Ok(ScopeInput {
        urls: config.urls.clone(),
        data,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = PreloadConfig::from(CliArgs::parse());
    init_logging(&config)?;

    info!(version = image_preloader::VERSION, "starting img-preload");

    let input = read_input(&config)?;
    let scope = build_scope(&config).await?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let success_tx = tx.clone();
    let callbacks = PreloadCallbacks::new()
        .on_success(move || {
            let _ = success_tx.send(Ok(()));
        })
        .on_error(move |error| {
            let _ = tx.send(Err(error));
        });

    let batch = scope.mount(&input, callbacks);
    info!(count = batch.len(), "preload batch started");

    match rx.recv().await {
        Some(Ok(())) => {
            println!("preloaded {} resource(s)", batch.len());
            Ok(())
        }
        Some(Err(error)) => Err(eyre!(error)),
        None => Err(eyre!("preload batch was discarded before completion")),
    }
}
