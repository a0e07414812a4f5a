use std::sync::{Arc, Mutex};

use dotenv::dotenv;
use hideseek::arena::{Arena, ArenaLayout, ArenaRunner, RandomPolicy, RunConfig};
use hideseek::infra::{CompositeObserver, DefaultObserver, EpisodeMetrics, MetricsObserver};
use time::{OffsetDateTime, format_description};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hideseek=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let config = RunConfig::from_env()?;
    tracing::info!(
        "Starting {} arenas x {} episodes ({}, {}) at {}",
        config.arena_count,
        config.episodes,
        config.arena.mode,
        config.arena.layout,
        timestamp()
    );

    let metrics = Arc::new(Mutex::new(EpisodeMetrics::default()));
    let layout = ArenaLayout::new(config.arena_count, config.arena.floor);

    let mut workers = Vec::with_capacity(config.arena_count);
    for (id, floor) in layout.floors().enumerate() {
        let mut arena_config = config.arena.clone();
        arena_config.floor = floor;
        let observer = CompositeObserver::new(vec![
            Box::new(DefaultObserver),
            Box::new(MetricsObserver::new(Arc::clone(&metrics))),
        ]);
        let arena = Arena::new(id, arena_config)?.with_observer(observer);
        let seed = config.arena.seed.map(|seed| seed.wrapping_add(1000 + id as u64));
        let episodes = config.episodes;

        workers.push(tokio::task::spawn_blocking(move || {
            let seeker = RandomPolicy::new(seed);
            let hider = RandomPolicy::new(seed.map(|seed| seed.wrapping_add(1)));
            let mut runner = ArenaRunner::new(arena, seeker, hider);
            runner.run(episodes).map(|summaries| summaries.len())
        }));
    }

    for (id, worker) in workers.into_iter().enumerate() {
        match worker.await? {
            Ok(count) => tracing::debug!("Arena {} finished {} episodes", id, count),
            Err(err) => tracing::error!("Arena {} failed: {}", id, err),
        }
    }

    match metrics.lock() {
        Ok(metrics) => metrics.print_summary(),
        Err(_) => tracing::warn!("Metrics unavailable, a worker panicked"),
    }
    tracing::info!("Finished at {}", timestamp());
    Ok(())
}
