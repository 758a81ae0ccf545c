//! Host-range expansion.
//!
//! Turns compact host lists such as `qh2-rcc[01-10,13]` or
//! `qh2-rcc5, qh2-rcc6` into the explicit set of hostnames.

use crate::error::{NotifyError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Matches `prefix[inner]suffix`, honouring only the first bracket group.
static BRACKET_REGEX: OnceLock<Regex> = OnceLock::new();

/// Largest number of values a single `lo-hi` range may produce.
pub const MAX_RANGE_SIZE: u64 = 100_000;

fn get_bracket_regex() -> &'static Regex {
    BRACKET_REGEX.get_or_init(|| Regex::new(r"^(.*?)\[(.*?)\](.*)$").expect("Invalid Regex"))
}

/// Expand a host expression into a sorted set of hostnames.
///
/// # Examples
/// ```
/// use outage_notify::processing::expand_hosts;
/// let hosts = expand_hosts("qh2-rcc[01-03,07]").unwrap();
/// assert_eq!(
///     hosts.into_iter().collect::<Vec<_>>(),
///     vec!["qh2-rcc1", "qh2-rcc2", "qh2-rcc3", "qh2-rcc7"]
/// );
/// ```
///
/// # Errors
/// * [`NotifyError::Parse`] on empty input, empty list items, unbalanced or
///   nested brackets, and bad ranges.
pub fn expand_hosts(expression: &str) -> Result<BTreeSet<String>> {
    let pieces = split_top_level(expression)?;

    if pieces.len() > 1 {
        let mut hosts = BTreeSet::new();
        for piece in pieces {
            hosts.extend(expand_hosts(piece)?);
        }
        return Ok(hosts);
    }

    let single = pieces[0];
    let Some(caps) = get_bracket_regex().captures(single) else {
        // Literal hostname
        return Ok(BTreeSet::from([single.to_string()]));
    };

    let (prefix, inner, suffix) = (&caps[1], &caps[2], &caps[3]);
    log::trace!("expand_hosts prefix={prefix:?} inner={inner:?} suffix={suffix:?}");

    let mut hosts = BTreeSet::new();
    for piece in split_top_level(inner).map_err(|_| NotifyError::parse(single, "empty range"))? {
        for value in expand_dash(piece, single)? {
            hosts.insert(format!("{prefix}{value}{suffix}"));
        }
    }
    Ok(hosts)
}

/// Split on commas outside of `[...]`, trimming whitespace around items.
fn split_top_level(expression: &str) -> Result<Vec<&str>> {
    if expression.trim().is_empty() {
        return Err(NotifyError::parse(expression, "empty expression"));
    }

    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in expression.char_indices() {
        match c {
            '[' => {
                depth += 1;
                if depth > 1 {
                    return Err(NotifyError::parse(expression, "nested '[' is not supported"));
                }
            }
            ']' => {
                if depth == 0 {
                    return Err(NotifyError::parse(expression, "unmatched ']'"));
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                pieces.push(&expression[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(NotifyError::parse(expression, "unclosed '['"));
    }
    pieces.push(&expression[start..]);

    pieces
        .into_iter()
        .map(|p| {
            let p = p.trim();
            if p.is_empty() {
                Err(NotifyError::parse(expression, "empty item in list"))
            } else {
                Ok(p)
            }
        })
        .collect()
}

/// Expand one bracket item: `lo-hi` is an inclusive numeric range, anything
/// else is a single value (normalised when numeric).
fn expand_dash(piece: &str, expression: &str) -> Result<Vec<String>> {
    let Some((lo, hi)) = piece.split_once('-') else {
        return Ok(vec![match piece.parse::<u64>() {
            Ok(n) => n.to_string(),
            Err(_) => piece.to_string(),
        }]);
    };

    let parse_bound = |bound: &str| {
        bound.trim().parse::<u64>().map_err(|_| {
            NotifyError::parse(expression, format!("bad range bound '{bound}' in '{piece}'"))
        })
    };
    let (lo, hi) = (parse_bound(lo)?, parse_bound(hi)?);
    if lo > hi {
        return Err(NotifyError::parse(
            expression,
            format!("range '{piece}' is descending"),
        ));
    }
    if hi - lo >= MAX_RANGE_SIZE {
        return Err(NotifyError::parse(
            expression,
            format!("range '{piece}' is too large (max {MAX_RANGE_SIZE} hosts)"),
        ));
    }
    Ok((lo..=hi).map(|n| n.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(expr: &str) -> Vec<String> {
        expand_hosts(expr)
            .expect("Error expanding hosts")
            .into_iter()
            .collect()
    }

    #[test]
    fn test_literal_host() {
        assert_eq!(hosts("qh2-rcc5"), vec!["qh2-rcc5"]);
        assert_eq!(hosts("compute.example.org"), vec!["compute.example.org"]);
    }

    #[test]
    fn test_simple_range() {
        assert_eq!(hosts("qh2-rcc[10-12]"), vec!["qh2-rcc10", "qh2-rcc11", "qh2-rcc12"]);
    }

    #[test]
    fn test_range_and_single_drop_zero_padding() {
        assert_eq!(
            hosts("qh2-rcc[01-03,07]"),
            vec!["qh2-rcc1", "qh2-rcc2", "qh2-rcc3", "qh2-rcc7"]
        );
    }

    #[test]
    fn test_comma_list() {
        assert_eq!(hosts("qh2-rcc5,qh2-rcc6"), vec!["qh2-rcc5", "qh2-rcc6"]);
        assert_eq!(hosts("qh2-rcc5, qh2-rcc6"), vec!["qh2-rcc5", "qh2-rcc6"]);
    }

    #[test]
    fn test_list_of_ranges_with_suffix_dedups() {
        assert_eq!(
            hosts("rcc[1-2].mel,rcc[2-3].mel"),
            vec!["rcc1.mel", "rcc2.mel", "rcc3.mel"]
        );
    }

    #[test]
    fn test_non_numeric_single_value_kept() {
        assert_eq!(hosts("node-[a,b]"), vec!["node-a", "node-b"]);
    }

    #[test]
    fn test_only_first_bracket_group_expanded() {
        assert_eq!(hosts("r[1-2]c[3]"), vec!["r1c[3]", "r2c[3]"]);
    }

    #[test]
    fn test_expansion_is_idempotent_for_literals() {
        for expr in ["qh2-rcc[10-12]", "a,b", "single"] {
            for host in expand_hosts(expr).unwrap() {
                assert_eq!(hosts(&host), vec![host.clone()]);
            }
        }
    }

    #[test]
    fn test_huge_range_rejected() {
        let err = expand_hosts("rcc[0-99999999999]").unwrap_err();
        match err {
            NotifyError::Parse { reason, .. } => assert!(reason.contains("too large"), "{reason}"),
            other => panic!("Expected Parse error, got {other:?}"),
        }
        assert_eq!(hosts("rcc[1-100000]").len(), 100_000);
        assert!(expand_hosts("rcc[0-100000]").is_err());
    }

    #[test]
    fn test_malformed_expressions() {
        for expr in [
            "qh2-rcc[10-",
            "",
            "   ",
            "qh2-rcc10]",
            "a,,b",
            "a,",
            "rcc[]",
            "rcc[1-x]",
            "rcc[5-3]",
            "rcc[[1-2]]",
        ] {
            match expand_hosts(expr) {
                Err(NotifyError::Parse { .. }) => {}
                other => panic!("Expected Parse error for {expr:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_error_names_expression() {
        let err = expand_hosts("qh2-rcc[10-").unwrap_err();
        assert!(err.to_string().contains("qh2-rcc[10-"), "{err}");
    }
}
