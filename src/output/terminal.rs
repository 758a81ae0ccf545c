//! Terminal output of the affected servers.

use crate::processing::Enrichment;
use colored::Colorize;

/// Left-align `value` in a column of `width`, cutting it with "~" when longer.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    if value_str.chars().count() > width && width > 0 {
        let cut: String = value_str.chars().take(width - 1).collect();
        format!("{cut}~")
    } else {
        format!("{value_str:<width$}")
    }
}

/// Table rows, one per affected server, in input order.
pub fn server_rows(enrichment: &Enrichment) -> Vec<String> {
    enrichment
        .servers()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let project = enrichment.project_of(s);
            format!(
                "{j} {id} {name} {host} {status} {project} {users}",
                j = format_field(i + 1, 5),
                id = format_field(&s.instance.id, 36),
                name = format_field(&s.instance.name, 24),
                host = format_field(s.instance.host.as_deref().unwrap_or("-"), 16),
                status = format_field(&s.instance.status, 9),
                project = format_field(&project.project.name, 24),
                users = enrichment.users_of(project).count(),
            )
        })
        .collect()
}

/// Print the affected servers table to stdout.
pub fn print_affected(enrichment: &Enrichment) {
    println!(
        "{}",
        format!(
            "{} {} {} {} {} {} users",
            format_field("cnt", 5),
            format_field("id", 36),
            format_field("name", 24),
            format_field("host", 16),
            format_field("status", 9),
            format_field("project", 24),
        )
        .bold()
    );
    for row in server_rows(enrichment) {
        println!("{row}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::enrich;
    use crate::testing::{sample_instance, FakeIdentity};
    use futures::stream;

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 6), "test  ");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("test", 4), "test");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "long~");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 4), "42  ");
    }

    #[tokio::test]
    async fn test_server_rows() {
        let identity = FakeIdentity::new()
            .with_project("p-alpha", "alpha", &["u-1"])
            .with_user("u-1", None);
        let instances = vec![sample_instance("a", "qh2-rcc10", "ACTIVE", "p-alpha")];
        let enrichment = enrich(stream::iter(instances.into_iter().map(Ok)), &identity)
            .await
            .unwrap();

        let rows = server_rows(&enrichment);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("1     a "));
        assert!(rows[0].contains("qh2-rcc10"));
        assert!(rows[0].trim_end().ends_with("alpha                    1"));
    }
}
