//! SEARCH, FILE and SEND workflows.

use crate::cli::{Cli, Command, FileArgs, QueueArgs, SearchArgs, SendArgs};
use crate::config::CloudConfig;
use crate::error::Result;
use crate::mailer::{send_all, SendReport, SmtpMailer};
use crate::openstack::{KeystoneClient, NovaClient, Session};
use crate::output::{build_messages, print_affected, write_outbox, Notice, OutageWindow};
use crate::processing::{
    enrich, hosts_by_aggregates, hosts_by_zones, instances_by_file, instances_by_hosts,
    Enrichment,
};
use crate::providers::{ComputeProvider, IdentityProvider};
use itertools::Itertools;
use std::path::PathBuf;
use std::sync::Arc;

/// Find and enrich the instances selected by a SEARCH.
pub async fn search<C, I>(compute: &C, identity: &I, args: &SearchArgs) -> Result<Enrichment>
where
    C: ComputeProvider + ?Sized,
    I: IdentityProvider + ?Sized,
{
    let target = &args.target;
    let hosts = if !target.aggregates.is_empty() {
        log::info!(
            "Searching hosts in the following aggregates: [{}]",
            target.aggregates.join(", ")
        );
        hosts_by_aggregates(compute, &target.aggregates).await?
    } else if !target.zones.is_empty() {
        log::info!(
            "Searching hosts for the following zones: [{}]",
            target.zones.join(", ")
        );
        hosts_by_zones(compute, &target.zones).await?
    } else {
        target.hosts.clone().unwrap_or_default()
    };

    log::info!(
        "Find instances for the following hosts: [{}]",
        hosts.iter().join(", ")
    );
    if !args.status.is_empty() {
        log::info!(
            "With the following status: [{}]",
            args.status.iter().map(|s| s.to_uppercase()).join(", ")
        );
    }

    enrich(instances_by_hosts(compute, &args.status, &hosts), identity).await
}

/// Find and enrich the instances listed in a FILE.
pub async fn from_file<C, I>(compute: &C, identity: &I, args: &FileArgs) -> Result<Enrichment>
where
    C: ComputeProvider + ?Sized,
    I: IdentityProvider + ?Sized,
{
    enrich(instances_by_file(compute, &args.file)?, identity).await
}

/// Print and log the result, then queue messages if an outbox was given.
pub fn report(
    enrichment: &Enrichment,
    notice: &Notice,
    queue: &QueueArgs,
) -> Result<Option<Vec<PathBuf>>> {
    print_affected(enrichment);
    for line in enrichment.summary().to_string().lines() {
        log::info!("{line}");
    }

    let Some(outbox) = &queue.outbox else {
        return Ok(None);
    };
    let messages = build_messages(enrichment, notice);
    write_outbox(outbox, &messages).map(Some)
}

async fn connect() -> Result<(NovaClient, KeystoneClient)> {
    let config = CloudConfig::from_env()?;
    log::debug!("{config:?}");
    let session = Arc::new(Session::authenticate(&config).await?);
    Ok((NovaClient::new(session.clone())?, KeystoneClient::new(session)?))
}

async fn run_send(args: &SendArgs) -> Result<SendReport> {
    let mailer = SmtpMailer::new(&args.smtp_server)?;
    send_all(&mailer, &args.outbox, &args.test_recipients).await
}

/// Run one command line invocation.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Search(args) => {
            let (nova, keystone) = connect().await?;
            let enrichment = search(&nova, &keystone, &args).await?;
            let notice = Notice {
                from: args.queue.from.clone(),
                subject: args.subject.clone(),
                window: OutageWindow {
                    start: args.start_time,
                    duration_hours: args.duration,
                    timezone: args.timezone.clone(),
                },
            };
            report(&enrichment, &notice, &args.queue)?;
        }
        Command::File(args) => {
            let (nova, keystone) = connect().await?;
            let enrichment = from_file(&nova, &keystone, &args).await?;
            let notice = Notice {
                from: args.queue.from.clone(),
                subject: args.subject.clone(),
                window: OutageWindow {
                    start: None,
                    duration_hours: None,
                    timezone: crate::config::DEFAULT_TIMEZONE.to_string(),
                },
            };
            report(&enrichment, &notice, &args.queue)?;
        }
        Command::Send(args) => {
            run_send(&args).await?;
        }
    }
    Ok(())
}
