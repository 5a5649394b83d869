//! Registrable-domain extraction based on the
//! [public suffix list](https://publicsuffix.org/list/).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Maps host names to registered (registrable) domain names.
pub trait DomainResolver {
    /// Registered domain of `host`: its public suffix plus one more label.
    ///
    /// If the host is itself a public suffix or no suffix matches, `strict`
    /// decides between `None` and returning the host unchanged.
    /// `include_private` also applies suffixes from the PRIVATE division.
    fn resolve(&self, host: &str, strict: bool, include_private: bool) -> Option<String>;

    /// Whether `host` is exactly a public suffix.
    fn is_public_suffix(&self, host: &str, include_private: bool) -> bool;
}

#[derive(Debug, Error)]
pub enum SuffixListError {
    #[error("Failed to read public suffix list {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Division of the public suffix list a rule was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Division {
    Icann,
    Private,
}

const BEGIN_PRIVATE: &str = "===BEGIN PRIVATE DOMAINS===";
const END_PRIVATE: &str = "===END PRIVATE DOMAINS===";

/// Parsed public suffix list.
#[derive(Debug, Default, Clone)]
pub struct SuffixList {
    rules: HashMap<String, Division>,
    /// `*.example` is stored as `example`
    wildcards: HashMap<String, Division>,
    /// `!www.example` is stored as `www.example`
    exceptions: HashMap<String, Division>,
}

impl SuffixList {
    pub fn from_file(path: &Path) -> Result<Self, SuffixListError> {
        let content = fs::read_to_string(path).map_err(|source| SuffixListError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let list = Self::parse(&content);
        tracing::info!(
            "Loaded public suffix list {} ({} rules)",
            path.display(),
            list.len()
        );
        Ok(list)
    }

    /// Parse the list format: one rule per line, `//` comments, `*.` wildcards
    /// and `!` exceptions. Rules after the `BEGIN PRIVATE DOMAINS` marker
    /// belong to the private division.
    pub fn parse(content: &str) -> Self {
        let mut list = Self::default();
        let mut division = Division::Icann;

        for line in content.lines() {
            let line = line.trim();
            if let Some(comment) = line.strip_prefix("//") {
                if comment.contains(BEGIN_PRIVATE) {
                    division = Division::Private;
                } else if comment.contains(END_PRIVATE) {
                    division = Division::Icann;
                }
                continue;
            }
            let rule = match line.split_whitespace().next() {
                Some(rule) => rule.to_lowercase(),
                None => continue,
            };
            if let Some(exception) = rule.strip_prefix('!') {
                list.exceptions.insert(exception.to_string(), division);
            } else if let Some(parent) = rule.strip_prefix("*.") {
                list.wildcards.insert(parent.to_string(), division);
            } else {
                list.rules.insert(rule, division);
            }
        }
        list
    }

    pub fn len(&self) -> usize {
        self.rules.len() + self.wildcards.len() + self.exceptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(map: &HashMap<String, Division>, key: &str, include_private: bool) -> bool {
        match map.get(key) {
            Some(Division::Icann) => true,
            Some(Division::Private) => include_private,
            None => false,
        }
    }

    /// Longest public suffix of a lower-cased host, as a byte offset into it.
    fn suffix_start(&self, host: &str, include_private: bool) -> Option<usize> {
        // byte offsets of every label start, longest candidate first
        let mut starts = vec![0];
        starts.extend(host.match_indices('.').map(|(i, _)| i + 1));

        for (n, &start) in starts.iter().enumerate() {
            let candidate = &host[start..];
            if Self::lookup(&self.exceptions, candidate, include_private) {
                return starts.get(n + 1).copied();
            }
            if Self::lookup(&self.rules, candidate, include_private) {
                return Some(start);
            }
            if let Some(&parent) = starts.get(n + 1) {
                if Self::lookup(&self.wildcards, &host[parent..], include_private) {
                    return Some(start);
                }
            }
        }
        None
    }
}

impl DomainResolver for SuffixList {
    fn resolve(&self, host: &str, strict: bool, include_private: bool) -> Option<String> {
        let fallback = || if strict { None } else { Some(host.to_string()) };
        let host_lc = host.to_lowercase();
        let start = match self.suffix_start(&host_lc, include_private) {
            Some(start) if start > 0 => start,
            _ => return fallback(),
        };
        // the suffix is preceded by a dot, add the label before it
        let prefix = &host_lc[..start - 1];
        if prefix.is_empty() {
            return fallback();
        }
        let label_start = prefix.rfind('.').map_or(0, |dot| dot + 1);
        Some(host_lc[label_start..].to_string())
    }

    fn is_public_suffix(&self, host: &str, include_private: bool) -> bool {
        let host = host.to_lowercase();
        self.suffix_start(&host, include_private) == Some(0)
    }
}
