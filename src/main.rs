use log::{error, info, warn};
use recipe_ingest::{
    build_pipeline, AppConfig, MemoryRepository, QueueProcessor, QueueScheduler, RecipeCaches,
    RecipeService, Repository, Submission,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const USAGE: &str = "Usage:\n  recipe-ingest extract <url>\n  recipe-ingest import <username> <url>...";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = AppConfig::load()?;

    match args.first().map(String::as_str) {
        Some("extract") => {
            let url = args.get(1).ok_or(USAGE)?;
            extract(&config, url).await
        }
        Some("import") => {
            let username = args.get(1).ok_or(USAGE)?;
            let urls = &args[2..];
            if urls.is_empty() {
                return Err(USAGE.into());
            }
            import(&config, username, urls).await
        }
        _ => Err(USAGE.into()),
    }
}

/// Run the pipeline once and print the recipe as JSON
async fn extract(config: &AppConfig, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    use recipe_ingest::Extractor;

    let pipeline = build_pipeline(config)?;
    let extraction = pipeline.extract(url).await?;
    info!("Extracted '{}' as {}", extraction.recipe.title, extraction.slug);
    println!("{}", serde_json::to_string_pretty(&extraction.recipe)?);
    Ok(())
}

/// Queue every URL for `username`, process until the queue drains, print the result
async fn import(
    config: &AppConfig,
    username: &str,
    urls: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = Arc::new(MemoryRepository::new());
    repo.create_user(username).await?;
    let caches = Arc::new(RecipeCaches::new(&config.cache));
    let pipeline = Arc::new(build_pipeline(config)?);
    let processor = Arc::new(QueueProcessor::new(
        repo.clone(),
        pipeline,
        caches.clone(),
        config.queue.clone(),
    ));
    let service = RecipeService::new(repo.clone(), caches);

    for url in urls {
        match service.submit_url(username, url).await {
            Ok(Submission::Queued(item)) => info!("Queued {} as item {}", url, item.id),
            Ok(Submission::Linked { slug }) => info!("Linked {} to existing {}", url, slug),
            Err(e) => warn!("Skipping {}: {}", url, e),
        }
    }

    let cancel = CancellationToken::new();
    let scheduler = QueueScheduler::new(processor).spawn(cancel.clone());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; stopping after the current batch");
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                match repo.fetch_pending_queue(0).await {
                    Ok(pending) if pending.is_empty() => break,
                    Ok(_) => {}
                    Err(e) => {
                        error!("Failed to read queue: {}", e);
                        break;
                    }
                }
            }
        }
    }

    cancel.cancel();
    scheduler.await?;

    let recipes = service.list_recipes(username, None).await?;
    println!("{}", serde_json::to_string_pretty(&recipes)?);
    Ok(())
}
