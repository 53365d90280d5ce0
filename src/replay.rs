use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use runledger::config::Config;
use runledger::jobs::{ScriptedPlan, SequentialRunner};
use runledger::ledger::Ledger;
use runledger::messaging::BroadcastPublisher;
use runledger::mirror::ConsoleMirror;
use runledger::service::LedgerService;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(config: Config, plan: PathBuf, mirror: bool) -> Result<(), AnyError> {
    let jobs = ScriptedPlan::load(&plan)?.into_jobs();
    info!(plan = %plan.display(), jobs = jobs.len(), "Replaying plan");

    let publisher = Arc::new(BroadcastPublisher::new(config.events.channel_capacity));
    // stdout carries the snapshot, so mirrored lines all go to stderr
    let mut ledger = Ledger::from_settings(&config.ledger)
        .with_publisher(publisher)
        .with_mirror(Arc::new(ConsoleMirror::stderr_only()));
    if mirror {
        ledger.set_mirror_to_stdout(true);
    }

    let service = LedgerService::spawn(ledger, &config.service);
    SequentialRunner::new(service.handle()).run_all(&jobs).await?;
    let ledger = service.shutdown().await?;

    let metrics = ledger.metrics().snapshot();
    info!(
        messages = metrics.messages_recorded,
        boundaries = metrics.boundaries_closed,
        publish_failures = metrics.publish_failures,
        "Replay complete"
    );

    println!("{}", serde_json::to_string_pretty(&ledger.snapshot())?);
    Ok(())
}
