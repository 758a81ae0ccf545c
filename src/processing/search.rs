//! Locating the instances affected by an outage.

use crate::error::{NotifyError, Result};
use crate::models::{Instance, ServerFilter};
use crate::providers::ComputeProvider;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeSet;
use std::path::Path;

/// Hosts belonging to any aggregate named in `names`.
pub async fn hosts_by_aggregates<C>(compute: &C, names: &[String]) -> Result<BTreeSet<String>>
where
    C: ComputeProvider + ?Sized,
{
    let hosts: BTreeSet<String> = compute
        .list_aggregates()
        .await?
        .into_iter()
        .filter(|a| names.contains(&a.name))
        .flat_map(|a| a.hosts)
        .collect();
    log::debug!("{} host(s) in aggregates [{}]", hosts.len(), names.join(", "));
    Ok(hosts)
}

/// Hosts of every aggregate tagged with one of the availability `zones`.
pub async fn hosts_by_zones<C>(compute: &C, zones: &[String]) -> Result<BTreeSet<String>>
where
    C: ComputeProvider + ?Sized,
{
    let hosts: BTreeSet<String> = compute
        .list_aggregates()
        .await?
        .into_iter()
        .filter(|a| {
            a.availability_zone()
                .is_some_and(|zone| zones.iter().any(|z| z == zone))
        })
        .flat_map(|a| a.hosts)
        .collect();
    log::debug!("{} host(s) in zones [{}]", hosts.len(), zones.join(", "));
    Ok(hosts)
}

/// Build one server query per host, or per (host, status) pair when statuses
/// are given. Statuses are upper-cased.
pub fn host_filters<'h, H>(hosts: H, statuses: &[String]) -> Vec<ServerFilter>
where
    H: IntoIterator<Item = &'h String>,
{
    let mut filters = Vec::new();
    for host in hosts {
        if statuses.is_empty() {
            filters.push(ServerFilter {
                host: Some(host.clone()),
                status: None,
                all_tenants: true,
            });
        } else {
            filters.extend(statuses.iter().map(|status| ServerFilter {
                host: Some(host.clone()),
                status: Some(status.to_uppercase()),
                all_tenants: true,
            }));
        }
    }
    filters
}

/// Stream the servers of every project on `hosts`, optionally restricted to
/// `statuses`.
pub fn instances_by_hosts<'a, C>(
    compute: &'a C,
    statuses: &[String],
    hosts: &BTreeSet<String>,
) -> BoxStream<'a, Result<Instance>>
where
    C: ComputeProvider + ?Sized,
{
    let filters = host_filters(hosts, statuses);
    if filters.is_empty() {
        log::warn!("No hosts to search");
    }
    stream::iter(filters)
        .flat_map(move |filter| compute.list_servers(filter))
        .boxed()
}

/// Read server ids from `path`, one per line, and stream each server.
///
/// Blank lines are ignored. No status or zone filtering is applied.
pub fn instances_by_file<'a, C>(
    compute: &'a C,
    path: impl AsRef<Path>,
) -> Result<BoxStream<'a, Result<Instance>>>
where
    C: ComputeProvider + ?Sized,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| NotifyError::io(path, e))?;
    let ids: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    log::info!("Read {} instance id(s) from {}", ids.len(), path.display());

    Ok(stream::iter(ids)
        .then(move |id| async move { compute.get_server(&id).await })
        .boxed())
}
