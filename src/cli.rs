//! Command line surface.

use crate::config::{DEFAULT_FROM, DEFAULT_SMTP_SERVER, DEFAULT_TIMEZONE};
use crate::output::parse_start_time;
use crate::processing::expand_hosts;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// One year.
pub const MAX_DURATION_HOURS: i64 = 8760;

/// Notifies users of an upcoming outage.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Set logging level to DEBUG.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search for affected instances on hosts, zones or aggregates.
    #[command(name = "SEARCH")]
    Search(SearchArgs),
    /// Get affected instances from a file of instance ids.
    #[command(name = "FILE")]
    File(FileArgs),
    /// Send all email from an outbox.
    #[command(name = "SEND")]
    Send(SendArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Subject of the email.
    #[arg(long)]
    pub subject: Option<String>,

    /// Only consider instances with this status (repeatable).
    #[arg(long)]
    pub status: Vec<String>,

    /// Timezone of the start time (e.g. AEDT, or Australia/Brisbane).
    #[arg(short = 't', long, default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,

    /// Outage start time (e.g. "09:00 25-06-2015").
    #[arg(short = 's', long, alias = "start_time", value_parser = parse_start_time)]
    pub start_time: Option<NaiveDateTime>,

    /// Duration of the outage in hours (1 to 8760).
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u32).range(1..=MAX_DURATION_HOURS))]
    pub duration: Option<u32>,

    #[command(flatten)]
    pub target: Target,

    #[command(flatten)]
    pub queue: QueueArgs,
}

/// Where to look for instances; exactly one is required.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// Only target instances in this availability zone (repeatable).
    #[arg(short = 'z', long = "zone")]
    pub zones: Vec<String>,

    /// Only target instances on these hosts (e.g. qh2-rcc[10-99]).
    #[arg(long, value_parser = expand_hosts)]
    pub hosts: Option<BTreeSet<String>>,

    /// Only target instances in this aggregate (repeatable).
    #[arg(short = 'a', long = "aggregate")]
    pub aggregates: Vec<String>,
}

#[derive(Debug, Args)]
pub struct FileArgs {
    /// File containing one instance id per line.
    pub file: PathBuf,

    /// Subject of the email.
    #[arg(long)]
    pub subject: Option<String>,

    #[command(flatten)]
    pub queue: QueueArgs,
}

#[derive(Debug, Args)]
pub struct QueueArgs {
    /// Write one message per affected project into this outbox folder.
    #[arg(long)]
    pub outbox: Option<PathBuf>,

    /// Sender address of queued messages.
    #[arg(long, default_value = DEFAULT_FROM)]
    pub from: String,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Path to the outbox folder containing queued messages.
    pub outbox: PathBuf,

    /// Send a SINGLE test email to this recipient instead (repeatable).
    #[arg(short = 'r', long = "test-recipient", alias = "test_recipient")]
    pub test_recipients: Vec<String>,

    /// SMTP server to relay through, "host" or "host:port".
    #[arg(short = 'p', long, alias = "smtp_server", default_value = DEFAULT_SMTP_SERVER)]
    pub smtp_server: String,
}
