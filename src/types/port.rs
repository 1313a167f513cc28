//! Port set parsing.
//!
//! A [`PortSet`] is the canonical form of a textual port specification such
//! as `"22,80,100-103,443"`: strictly ascending, no duplicates. Parsing is
//! lenient. Malformed tokens are dropped rather than failing the whole input,
//! and bounds are not enforced here. The probe layer rejects anything outside
//! `0-65535` with a per-task error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// An ordered, deduplicated set of port numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortSet {
    ports: Vec<u32>,
}

impl PortSet {
    /// Parse a comma-separated port specification.
    ///
    /// Each token is either a single integer or an inclusive `start-end`
    /// range. Tokens that fail integer conversion are skipped, and a range
    /// whose start exceeds its end contributes nothing.
    pub fn parse(spec: &str) -> Self {
        let mut ports = BTreeSet::new();

        for token in spec.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            if token.contains('-') {
                if let Some((start, end)) = parse_range(token) {
                    ports.extend(start..=end);
                }
            } else if let Ok(port) = token.parse::<u32>() {
                ports.insert(port);
            }
        }

        Self {
            ports: ports.into_iter().collect(),
        }
    }

    /// Number of ports in the set.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, port: u32) -> bool {
        self.ports.binary_search(&port).is_ok()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.ports
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.ports.iter().copied()
    }
}

/// Split a `start-end` token. Anything other than exactly two integer bounds
/// is rejected.
fn parse_range(token: &str) -> Option<(u32, u32)> {
    let mut bounds = token.split('-');
    let start = bounds.next()?.trim().parse::<u32>().ok()?;
    let end = bounds.next()?.trim().parse::<u32>().ok()?;
    if bounds.next().is_some() {
        return None;
    }
    Some((start, end))
}

impl FromStr for PortSet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl<'a> IntoIterator for &'a PortSet {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(spec: &str) -> Vec<u32> {
        PortSet::parse(spec).as_slice().to_vec()
    }

    #[test]
    fn test_single_port() {
        assert_eq!(parse("80"), vec![80]);
    }

    #[test]
    fn test_multiple_ports() {
        assert_eq!(parse("80,443,8080"), vec![80, 443, 8080]);
    }

    #[test]
    fn test_port_range() {
        assert_eq!(parse("20-25"), vec![20, 21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_mixed_format() {
        assert_eq!(
            parse("22,80,100-103,443"),
            vec![22, 80, 100, 101, 102, 103, 443]
        );
    }

    #[test]
    fn test_invalid_tokens_are_skipped() {
        assert_eq!(parse("abc,80,xyz"), vec![80]);
        assert_eq!(parse("1-x,y-5,22"), vec![22]);
        assert_eq!(parse("1-2-3,9"), vec![9]);
        assert_eq!(parse("-5,7"), vec![7]);
    }

    #[test]
    fn test_duplicates_removed() {
        assert_eq!(parse("80,80,80"), vec![80]);
        assert_eq!(parse("20-22,21,22-23"), vec![20, 21, 22, 23]);
    }

    #[test]
    fn test_sorted_output() {
        assert_eq!(parse("443,22,80"), vec![22, 80, 443]);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        assert!(PortSet::parse("100-50").is_empty());
        assert_eq!(parse("100-50,7"), vec![7]);
    }

    #[test]
    fn test_whitespace_and_empty_tokens() {
        assert_eq!(parse(" 22 , 80 - 81 ,, "), vec![22, 80, 81]);
        assert!(PortSet::parse("").is_empty());
    }

    #[test]
    fn test_out_of_range_kept_for_probe_layer() {
        let set = PortSet::parse("65535,70000");
        assert_eq!(set.as_slice(), &[65535, 70000]);
    }

    #[test]
    fn test_reparse_of_display_is_stable() {
        for spec in ["443,22,80", "1-10,5,200-198,abc", "8080,21-23,22"] {
            let set = PortSet::parse(spec);
            let again = PortSet::parse(&set.to_string());
            assert_eq!(set, again);
            assert!(set.as_slice().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_contains() {
        let set: PortSet = "22,80-82".parse().unwrap();
        assert!(set.contains(81));
        assert!(!set.contains(83));
        assert_eq!(set.len(), 4);
    }
}
