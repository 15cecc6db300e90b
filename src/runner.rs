//! Orchestration of one run: optional preflight, mirror, then publish.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::check::{check_source, check_target};
use crate::config::{Endpoint, RunConfig};
use crate::error::RunError;
use crate::mirror::{Crawler, HttpSource, LinkFilter};
use crate::publish::{HttpTarget, Publisher};
use crate::summary::SummarySnapshot;
use crate::transport::{RequestTimeout, TransportConfig, build_client};

/// What a run did, including how far it got before an error.
#[derive(Debug)]
pub struct RunReport {
    /// Mirror counts, if the mirror action started.
    pub mirror: Option<SummarySnapshot>,
    /// Publish counts, if the publish action started.
    pub publish: Option<SummarySnapshot>,
    /// The error that ended the run early.
    pub error: Option<RunError>,
}

/// Overall classification of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every transfer succeeded or was skipped.
    Complete,
    /// The run finished but some transfers failed.
    Partial,
    /// The run stopped early.
    Aborted,
}

impl RunReport {
    fn empty() -> Self {
        Self {
            mirror: None,
            publish: None,
            error: None,
        }
    }

    /// Returns the number of failed transfers over both pipelines.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.summaries().map(|s| s.failed).sum()
    }

    /// Iterates over the summaries of the pipelines that ran.
    pub fn summaries(&self) -> impl Iterator<Item = &SummarySnapshot> {
        self.mirror.iter().chain(self.publish.iter())
    }

    /// Classifies the run for exit reporting.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if self.error.is_some() {
            RunStatus::Aborted
        } else if self.failed() > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Complete
        }
    }
}

/// Executes the configured actions.
///
/// Never returns early without a report: the counts collected up to an
/// error are kept so they can still be printed.
#[instrument(skip(config), fields(actions = %config.actions))]
pub async fn run(config: &RunConfig) -> RunReport {
    let mut report = RunReport::empty();
    if let Err(e) = execute(config, &mut report).await {
        error!(error = %e, "run stopped");
        report.error = Some(e);
    }
    report
}

async fn execute(config: &RunConfig, report: &mut RunReport) -> Result<(), RunError> {
    config.validate()?;

    let source = config.actions.mirror.then_some(config.source.as_ref()).flatten();
    let target = config.actions.publish.then_some(config.target.as_ref()).flatten();

    let source_client = source
        .map(|endpoint| {
            build_client(
                &transport_for(config, endpoint)
                    .with_timeouts(
                        config.timeouts.connect,
                        RequestTimeout::Idle(config.timeouts.download),
                    ),
            )
        })
        .transpose()?;
    let target_client = target
        .map(|endpoint| {
            build_client(
                &transport_for(config, endpoint)
                    .with_timeouts(
                        config.timeouts.connect,
                        RequestTimeout::Total(config.timeouts.upload),
                    ),
            )
        })
        .transpose()?;

    if config.check {
        if let (Some(endpoint), Some(client)) = (source, &source_client) {
            check_source(client, &endpoint.root_url, endpoint.credentials.as_ref()).await?;
        }
        if let (Some(endpoint), Some(client)) = (target, &target_client) {
            check_target(client, &endpoint.root_url, endpoint.credentials.as_ref()).await?;
        }
    }

    if let (Some(endpoint), Some(client)) = (source, source_client) {
        let http = HttpSource::new(client, endpoint.credentials.clone());
        let crawler = Crawler::new(Arc::new(http), LinkFilter::default(), config.crawl)?;
        let result = crawler.mirror(&endpoint.root_url, &config.mirror_path).await;
        report.mirror = Some(crawler.summary());
        result?;
    }

    if let (Some(endpoint), Some(client)) = (target, target_client) {
        let http = HttpTarget::new(client, endpoint.credentials.clone());
        let publisher = Publisher::new(Arc::new(http), config.publish)?;
        let result = publisher.publish(&config.mirror_path, &endpoint.root_url).await;
        report.publish = Some(publisher.summary());
        result?;
    }

    info!("Done.");
    Ok(())
}

fn transport_for(config: &RunConfig, endpoint: &Endpoint) -> TransportConfig {
    TransportConfig::new(endpoint.credentials.clone()).with_proxy(config.proxy.clone())
}
