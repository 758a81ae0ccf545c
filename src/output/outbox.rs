//! Queued notification messages.
//!
//! SEARCH and FILE write one JSON message per affected project into an outbox
//! directory; SEND reads them back.

use crate::config::START_TIME_FORMAT;
use crate::error::{from_json_str, NotifyError, Result};
use crate::processing::{AffectedProject, Enrichment};
use chrono::{NaiveDateTime, TimeDelta, TimeZone, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One email waiting in the outbox.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutboxMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// When the outage happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutageWindow {
    pub start: Option<NaiveDateTime>,
    pub duration_hours: Option<u32>,
    /// Label such as "AEDT", or an IANA name such as "Australia/Brisbane".
    pub timezone: String,
}

/// Parse a start time such as "09:00 25-06-2015".
pub fn parse_start_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), START_TIME_FORMAT).map_err(|e| {
        NotifyError::parse(value, format!("expected \"HH:MM DD-MM-YYYY\" ({e})"))
    })
}

impl OutageWindow {
    /// End of the window; `None` without a start or duration, or when the
    /// end is past the last representable date.
    pub fn end(&self) -> Option<NaiveDateTime> {
        let hours = TimeDelta::try_hours(i64::from(self.duration_hours?))?;
        self.start?.checked_add_signed(hours)
    }

    /// `time` in UTC when the timezone is a known IANA name.
    fn to_utc(&self, time: NaiveDateTime) -> Option<String> {
        let tz: chrono_tz::Tz = self.timezone.parse().ok()?;
        let utc = tz.from_local_datetime(&time).single()?.with_timezone(&Utc);
        Some(utc.format("%H:%M %d-%m-%Y UTC").to_string())
    }

    fn format_time(&self, time: NaiveDateTime) -> String {
        let local = format!("{} {}", time.format(START_TIME_FORMAT), self.timezone);
        match self.to_utc(time) {
            Some(utc) => format!("{local} ({utc})"),
            None => local,
        }
    }

    /// Human readable description of the window.
    pub fn describe(&self) -> String {
        let Some(start) = self.start else {
            return "at a time to be announced".to_string();
        };
        match (self.duration_hours, self.end()) {
            (Some(hours), Some(end)) => format!(
                "starting {} for {hours} hour(s), until {}",
                self.format_time(start),
                self.format_time(end)
            ),
            _ => format!("starting {}", self.format_time(start)),
        }
    }
}

/// Sender, subject and window shared by every message of a run.
#[derive(Debug, Clone)]
pub struct Notice {
    pub from: String,
    pub subject: Option<String>,
    pub window: OutageWindow,
}

impl Notice {
    fn subject_for(&self, project: &AffectedProject) -> String {
        self.subject
            .clone()
            .unwrap_or_else(|| format!("Upcoming outage affecting project {}", project.project.name))
    }
}

/// Build one message per affected project, keyed by project id.
///
/// Recipients are the distinct email addresses of the project's users.
/// Projects without any addressable user are skipped with a warning.
pub fn build_messages(enrichment: &Enrichment, notice: &Notice) -> Vec<(String, OutboxMessage)> {
    let mut messages = Vec::new();
    for project in enrichment.projects() {
        let to: Vec<String> = enrichment
            .users_of(project)
            .filter(|u| u.enabled)
            .filter_map(|u| u.email.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .sorted()
            .dedup()
            .collect();
        if to.is_empty() {
            log::warn!(
                "No email address for any user of project {} ({}), skipping",
                project.project.name,
                project.project.id
            );
            continue;
        }

        let mut body = format!(
            "Dear members of project {},\n\n\
             An outage is scheduled {}.\n\
             The following instance(s) of your project will be affected:\n\n",
            project.project.name,
            notice.window.describe()
        );
        for server in enrichment.servers_of(project) {
            body.push_str(&format!("  {server}\n"));
        }

        messages.push((
            project.project.id.clone(),
            OutboxMessage {
                from: notice.from.clone(),
                to,
                subject: notice.subject_for(project),
                body,
            },
        ));
    }
    messages
}

/// Queued `*.json` files of `dir`, sorted by file name.
fn outbox_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| NotifyError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| NotifyError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Messages already in `dir` that a write of `messages` would not replace.
pub fn stale_messages(dir: &Path, messages: &[(String, OutboxMessage)]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(outbox_files(dir)?
        .into_iter()
        .filter(|path| {
            !messages
                .iter()
                .any(|(key, _)| *path == dir.join(format!("{key}.json")))
        })
        .collect())
}

/// Write `messages` as `<key>.json` files into `dir`, creating it if needed.
///
/// Messages left over from an earlier run are kept but reported, since SEND
/// delivers everything in the outbox.
pub fn write_outbox(dir: &Path, messages: &[(String, OutboxMessage)]) -> Result<Vec<PathBuf>> {
    for path in stale_messages(dir, messages)? {
        log::warn!(
            "{} was not written by this run and will also be sent",
            path.display()
        );
    }
    std::fs::create_dir_all(dir).map_err(|e| NotifyError::io(dir, e))?;
    let mut written = Vec::with_capacity(messages.len());
    for (key, message) in messages {
        let path = dir.join(format!("{key}.json"));
        let json = serde_json::to_string_pretty(message).map_err(|e| NotifyError::Json {
            path: path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&path, json).map_err(|e| NotifyError::io(&path, e))?;
        log::debug!("Queued {} recipient(s) in {}", message.to.len(), path.display());
        written.push(path);
    }
    log::info!("Wrote {} message(s) to outbox {}", written.len(), dir.display());
    Ok(written)
}

/// Read every `*.json` message of `dir`, in file name order.
pub fn read_outbox(dir: &Path) -> Result<Vec<(PathBuf, OutboxMessage)>> {
    let paths = outbox_files(dir)?;
    let mut messages = Vec::with_capacity(paths.len());
    for path in paths {
        let json = std::fs::read_to_string(&path).map_err(|e| NotifyError::io(&path, e))?;
        let message: OutboxMessage = from_json_str(&json).map_err(|e| {
            log::error!("Bad outbox message {}", path.display());
            e
        })?;
        messages.push((path, message));
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::enrich;
    use crate::testing::{sample_instance, FakeIdentity};
    use futures::stream;

    fn window(start: Option<&str>, hours: Option<u32>, tz: &str) -> OutageWindow {
        OutageWindow {
            start: start.map(|s| parse_start_time(s).unwrap()),
            duration_hours: hours,
            timezone: tz.to_string(),
        }
    }

    #[test]
    fn test_parse_start_time() {
        let t = parse_start_time("09:00 25-06-2015").unwrap();
        assert_eq!(t.format("%Y-%m-%d %H:%M").to_string(), "2015-06-25 09:00");
        assert!(matches!(
            parse_start_time("25/06/2015 9am"),
            Err(NotifyError::Parse { .. })
        ));
    }

    #[test]
    fn test_window_describe() {
        assert_eq!(
            window(Some("22:00 25-06-2015"), Some(4), "AEDT").describe(),
            "starting 22:00 25-06-2015 AEDT for 4 hour(s), until 02:00 26-06-2015 AEDT"
        );
        assert_eq!(
            window(Some("09:00 25-06-2015"), None, "AEDT").describe(),
            "starting 09:00 25-06-2015 AEDT"
        );
        assert_eq!(window(None, Some(2), "AEDT").describe(), "at a time to be announced");
    }

    #[test]
    fn test_window_end_overflow_is_not_a_panic() {
        let huge = window(Some("09:00 25-06-2015"), Some(u32::MAX), "AEDT");
        assert_eq!(huge.end(), None);
        assert_eq!(huge.describe(), "starting 09:00 25-06-2015 AEDT");

        let late = OutageWindow {
            start: Some(NaiveDateTime::MAX),
            duration_hours: Some(1),
            timezone: "AEDT".to_string(),
        };
        assert_eq!(late.end(), None);
    }

    #[test]
    fn test_window_iana_timezone_adds_utc() {
        let described = window(Some("10:00 25-06-2015"), None, "Australia/Brisbane").describe();
        assert_eq!(
            described,
            "starting 10:00 25-06-2015 Australia/Brisbane (00:00 25-06-2015 UTC)"
        );
    }

    async fn sample_enrichment() -> Enrichment {
        let identity = FakeIdentity::new()
            .with_project("p-alpha", "alpha", &["u-1", "u-2"])
            .with_project("p-beta", "beta", &["u-3"])
            .with_user("u-1", Some("zed@example.org"))
            .with_user("u-2", Some("amy@example.org"))
            .with_user("u-3", None);
        let instances = vec![
            sample_instance("a", "qh2-rcc10", "ACTIVE", "p-alpha"),
            sample_instance("b", "qh2-rcc10", "ACTIVE", "p-beta"),
            sample_instance("c", "qh2-rcc11", "SHUTOFF", "p-alpha"),
        ];
        enrich(stream::iter(instances.into_iter().map(Ok)), &identity)
            .await
            .unwrap()
    }

    fn notice() -> Notice {
        Notice {
            from: "support@example.org".to_string(),
            subject: None,
            window: window(Some("09:00 25-06-2015"), Some(2), "AEDT"),
        }
    }

    #[tokio::test]
    async fn test_build_messages_one_per_addressable_project() {
        let enrichment = sample_enrichment().await;
        let messages = build_messages(&enrichment, &notice());

        assert_eq!(messages.len(), 1, "beta has no email address");
        let (key, message) = &messages[0];
        assert_eq!(key, "p-alpha");
        assert_eq!(message.to, vec!["amy@example.org", "zed@example.org"]);
        assert_eq!(message.subject, "Upcoming outage affecting project alpha");
        assert!(message.body.contains("vm-a (a) on qh2-rcc10 [ACTIVE]"));
        assert!(message.body.contains("vm-c (c) on qh2-rcc11 [SHUTOFF]"));
        assert!(!message.body.contains("vm-b"));
        assert!(message.body.contains("until 11:00 25-06-2015 AEDT"));
    }

    #[tokio::test]
    async fn test_outbox_write_then_read() {
        let enrichment = sample_enrichment().await;
        let mut notice = notice();
        notice.subject = Some("Maintenance".to_string());
        let messages = build_messages(&enrichment, &notice);

        let dir = tempfile::tempdir().unwrap();
        let outbox = dir.path().join("outbox");
        let written = write_outbox(&outbox, &messages).unwrap();
        assert_eq!(written, vec![outbox.join("p-alpha.json")]);

        std::fs::write(outbox.join("README.txt"), "not a message").unwrap();
        let read = read_outbox(&outbox).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].1, messages[0].1);
        assert_eq!(read[0].1.subject, "Maintenance");
    }

    #[tokio::test]
    async fn test_stale_messages_from_earlier_run() {
        let enrichment = sample_enrichment().await;
        let messages = build_messages(&enrichment, &notice());
        let dir = tempfile::tempdir().unwrap();

        assert!(stale_messages(&dir.path().join("missing"), &messages)
            .unwrap()
            .is_empty());

        write_outbox(dir.path(), &messages).unwrap();
        assert!(stale_messages(dir.path(), &messages).unwrap().is_empty());

        std::fs::write(dir.path().join("p-old.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        assert_eq!(
            stale_messages(dir.path(), &messages).unwrap(),
            vec![dir.path().join("p-old.json")]
        );
        let written = write_outbox(dir.path(), &messages).unwrap();
        assert_eq!(written, vec![dir.path().join("p-alpha.json")]);
    }

    #[test]
    fn test_read_outbox_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), r#"{"from": "x", "to": "y"}"#).unwrap();
        assert!(matches!(
            read_outbox(dir.path()),
            Err(NotifyError::Json { .. })
        ));
    }
}
