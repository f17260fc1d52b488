use listingseo_core::{AnalysisStatus, NewAnalysis};
use listingseo_engine::MemoryStore;

use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["listingseo-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn parses_process_command_with_uuid() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from(["listingseo-cli", "process", &id.to_string()])
        .expect("expected valid cli args");

    assert!(matches!(cli.command, Some(Commands::Process { id: parsed }) if parsed == id));
}

#[test]
fn rejects_malformed_report_id() {
    assert!(Cli::try_parse_from(["listingseo-cli", "report", "not-a-uuid"]).is_err());
}

#[test]
fn analyze_defaults_to_amazon() {
    let cli = Cli::try_parse_from(["listingseo-cli", "analyze", "--name", "Desk Lamp"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Analyze {
            marketplace: Marketplace::Amazon,
            description: None,
            ..
        })
    ));
}

#[test]
fn analyze_rejects_unknown_marketplace() {
    let result = Cli::try_parse_from([
        "listingseo-cli",
        "analyze",
        "--name",
        "Desk Lamp",
        "--marketplace",
        "ebay",
    ]);
    assert!(result.is_err());
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["listingseo-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[tokio::test]
async fn offline_analyze_produces_completed_report() {
    let report = analysis::run_analyze_offline("Wireless Mouse", Marketplace::Amazon, Some("  "))
        .await
        .expect("offline analysis");

    assert_eq!(report.analysis.status, AnalysisStatus::Completed);
    assert!(report.analysis.product_description.is_none());
    assert_eq!(report.competitors.len(), 5);
    assert_eq!(report.content.map(|c| c.seo_score), Some(72));
    assert!((0..=100).contains(&report.metrics.keyword_density_percent));
}

#[tokio::test]
async fn offline_analyze_rejects_short_name() {
    let err = analysis::run_analyze_offline("x", Marketplace::Flipkart, None)
        .await
        .expect_err("should fail validation");
    assert!(err.to_string().contains("at least"));
}

#[tokio::test]
async fn process_takes_over_interrupted_scan() {
    let store = Arc::new(MemoryStore::new());
    let analysis = store
        .create_analysis(&NewAnalysis {
            owner_id: Uuid::new_v4(),
            product_name: "Desk Lamp".to_string(),
            product_description: None,
            product_features: None,
            category: None,
            marketplace: Marketplace::Meesho,
        })
        .await
        .expect("create");
    store
        .transition_status(analysis.id, AnalysisStatus::Pending, AnalysisStatus::Scanning)
        .await
        .expect("transition");

    let status = analysis::run_process(store, &EngineServices::offline("IN"), analysis.id)
        .await
        .expect("process");

    assert_eq!(status, AnalysisStatus::Completed);
}
