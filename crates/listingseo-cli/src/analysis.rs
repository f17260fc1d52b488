//! Analysis command handlers for the CLI.

use std::sync::Arc;

use anyhow::Context;
use listingseo_core::{AnalysisStatus, AnalysisStore, Marketplace, NewAnalysis};
use listingseo_engine::{build_report, AnalysisReport, EngineServices, MemoryStore};
use uuid::Uuid;

/// Geography used for trend lookups in offline runs. No trends provider is
/// configured offline, so it only labels the run.
const OFFLINE_GEO: &str = "IN";

/// Run the workflow for `id` and return the analysis' status afterwards.
///
/// An analysis stuck in `scanning` after a crash is taken over; do not run
/// this while the server may still be processing the same id.
pub(crate) async fn run_process(
    store: Arc<dyn AnalysisStore>,
    engine: &EngineServices,
    id: Uuid,
) -> anyhow::Result<AnalysisStatus> {
    let outcome = engine
        .workflow(Arc::clone(&store))
        .resume(id)
        .await
        .with_context(|| format!("processing analysis {id}"))?;
    tracing::info!(analysis_id = %id, ?outcome, "workflow finished");

    let analysis = store
        .get_analysis(id)
        .await?
        .with_context(|| format!("analysis {id} disappeared"))?;
    Ok(analysis.status)
}

pub(crate) async fn run_report(
    store: &dyn AnalysisStore,
    engine: &EngineServices,
    id: Uuid,
) -> anyhow::Result<AnalysisReport> {
    build_report(store, &engine.trends, &engine.trends_geo, id)
        .await?
        .with_context(|| format!("analysis {id} not found"))
}

/// Create, process and report one analysis without a database or API keys.
pub(crate) async fn run_analyze_offline(
    name: &str,
    marketplace: Marketplace,
    description: Option<&str>,
) -> anyhow::Result<AnalysisReport> {
    let new = NewAnalysis {
        owner_id: Uuid::nil(),
        product_name: name.trim().to_owned(),
        product_description: description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(ToOwned::to_owned),
        product_features: None,
        category: None,
        marketplace,
    };
    new.validate()?;

    let store = Arc::new(MemoryStore::new());
    let engine = EngineServices::offline(OFFLINE_GEO);
    let analysis = store.create_analysis(&new).await?;

    run_process(store.clone(), &engine, analysis.id).await?;
    run_report(store.as_ref(), &engine, analysis.id).await
}
