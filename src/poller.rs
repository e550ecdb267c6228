use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::feeds::EarthquakeFeed;
use crate::service::{CycleOutcome, DisasterMap};

/// Spawns one polling task per configured feed.
pub fn spawn_pollers(service: &DisasterMap, config: &Config) -> anyhow::Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::new();
    if !config.poll_enabled {
        tracing::info!("feed polling disabled");
        return Ok(handles);
    }

    let feed: EarthquakeFeed = config.earthquake_feed()?;
    let quakes = service.clone();
    handles.push(spawn_loop("earthquakes", config.earthquake_interval(), move || {
        let quakes = quakes.clone();
        async move { quakes.refresh_earthquakes(feed).await }
    }));

    if !config.alert_states.is_empty() {
        let area = config.alert_states.join(",");
        let alerts = service.clone();
        handles.push(spawn_loop("alerts", config.alert_interval(), move || {
            let alerts = alerts.clone();
            let area = area.clone();
            async move { alerts.refresh_alerts(&area).await }
        }));
    }

    Ok(handles)
}

fn spawn_loop<F, Fut>(name: &'static str, period: Duration, mut refresh: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<CycleOutcome>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(feed = name, ?period, "polling started");

        loop {
            interval.tick().await;
            match refresh().await {
                Ok(CycleOutcome {
                    report: Some(report),
                    ..
                }) => tracing::info!(feed = name, added = report.added, "poll applied"),
                Ok(CycleOutcome { report: None, .. }) => {
                    tracing::debug!(feed = name, "poll superseded by a newer cycle")
                }
                Err(e) => tracing::error!(feed = name, "poll failed, keeping previous markers: {}", e),
            }
        }
    })
}
