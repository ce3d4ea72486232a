// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metals-Tracker region report
//!
//! Reads the surveyed regions from Firestore, applies the configured filter
//! and prints the visible regions as a GeoJSON FeatureCollection.

use metals_tracker::{
    config::Config,
    db::{FirestoreDb, RegionStore},
    services::cache,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the report
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(
        project = %config.gcp_project_id,
        collection = %config.regions_collection,
        "Starting region report"
    );

    let db = FirestoreDb::new(&config).await?;
    let filter = config.filter.to_filter()?;

    let regions = cache::sync(db.list_regions().await?)?;
    let features: Vec<geojson::Feature> = filter
        .apply(&regions)
        .filter_map(|(_, region)| region.to_feature())
        .collect();
    tracing::info!(
        total = regions.len(),
        visible = features.len(),
        "Regions filtered"
    );

    let collection = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    println!("{}", serde_json::to_string_pretty(&collection)?);
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("metals_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
