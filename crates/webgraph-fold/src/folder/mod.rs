//! Conversion of a host-level web graph into a domain-level web graph.
//!
//! A graph is given as two tab-separated text streams:
//!
//! - vertices: `<id>\t<reversed host name>`, sorted lexicographically by the
//!   reversed name, ids `0..n` assigned in that order
//! - edges: `<from id>\t<to id>`, sorted by from id, then to id
//!
//! These orderings keep the memory bound at one id slot per host plus the
//! domains queued until all their hosts have been seen. The node pass fills
//! the host-to-domain map and is finished by [`DomainFolder::finish_nodes`],
//! which hands the map over to an [`EdgeFolder`] for the edge pass.

pub mod domain;
pub mod id_map;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::FoldConfig;
use crate::error::{FoldError, Result};
use crate::names::{registered_domain_reversed, reverse_host};
use crate::suffix::DomainResolver;
use domain::{Domain, DomainQueue};
use id_map::{FlatIds, IdStore};

/// Output vertex: `<id>\t<reversed domain name>[\t<host count>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainVertex {
    pub id: u64,
    pub rev_name: String,
    /// Present if hosts are counted.
    pub host_count: Option<u64>,
}

impl fmt::Display for DomainVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.id, self.rev_name)?;
        if let Some(count) = self.host_count {
            write!(f, "\t{}", count)?;
        }
        Ok(())
    }
}

/// Output edge between two domain ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainEdge {
    pub from: u64,
    pub to: u64,
}

impl fmt::Display for DomainEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.from, self.to)
    }
}

/// Counters of a folding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldStats {
    pub node_lines: u64,
    pub domains: u64,
    pub max_queue_used: usize,
    pub unmapped_hosts: u64,
    pub edge_lines: u64,
    pub edges_written: u64,
}

fn parse_id(value: &str, line: &str) -> Result<u64> {
    value.parse().map_err(|_| FoldError::InvalidId {
        line: line.to_string(),
    })
}

/// Node pass of the host-to-domain conversion.
pub struct DomainFolder<R, S = FlatIds> {
    config: FoldConfig,
    resolver: R,
    ids: S,
    queue: DomainQueue,
    /// Reversed name of the domain the last host was added to
    current: Option<String>,
    last_rev_host: Option<String>,
    stats: FoldStats,
}

impl<R: DomainResolver, S: IdStore> DomainFolder<R, S> {
    /// Allocate the host-to-domain map for the configured capacity.
    ///
    /// Fails if the capacity exceeds what the store type `S` can hold.
    pub fn new(config: FoldConfig, resolver: R) -> Result<Self> {
        if config.max_host_id > S::MAX_CAPACITY {
            return Err(FoldError::StoreTooSmall {
                store: S::KIND,
                configured: config.max_host_id,
                available: S::MAX_CAPACITY,
            });
        }
        let ids = S::with_capacity(config.max_host_id);
        Self::with_store(config, resolver, ids)
    }

    /// Use an allocated store, which must cover the configured capacity.
    pub fn with_store(config: FoldConfig, resolver: R, ids: S) -> Result<Self> {
        if ids.capacity() < config.max_host_id {
            return Err(FoldError::StoreTooSmall {
                store: S::KIND,
                configured: config.max_host_id,
                available: ids.capacity(),
            });
        }
        config.log_summary(S::KIND);
        Ok(Self {
            config,
            resolver,
            ids,
            queue: DomainQueue::new(),
            current: None,
            last_rev_host: None,
            stats: FoldStats::default(),
        })
    }

    pub fn stats(&self) -> &FoldStats {
        &self.stats
    }

    /// Number of domains currently waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Convert one vertex line. Returns the domain vertices which became safe
    /// to output, in id order.
    ///
    /// Lines without a tab are skipped. Fails if the reversed host name does
    /// not sort strictly after the one in the previous line.
    pub fn convert_node(&mut self, line: &str) -> Result<Vec<DomainVertex>> {
        self.stats.node_lines += 1;
        let (id, rev_host) = match line.split_once('\t') {
            Some(parts) => parts,
            None => {
                warn!("Skipping invalid line: <{}>", line);
                return Ok(Vec::new());
            }
        };
        let id = parse_id(id, line)?;

        if let Some(last) = self.last_rev_host.as_deref() {
            if last >= rev_host {
                error!(
                    "Reversed host names in input are not properly sorted: {} <> {}",
                    last, rev_host
                );
                return Err(FoldError::UnsortedInput {
                    previous: last.to_string(),
                    current: rev_host.to_string(),
                });
            }
        }
        let last = self.last_rev_host.get_or_insert_with(String::new);
        last.clear();
        last.push_str(rev_host);

        let rev_domain = match self.domain_of(rev_host) {
            Some(rev_domain) => rev_domain,
            None => {
                warn!("No domain for host: {}", reverse_host(rev_host));
                self.stats.unmapped_hosts += 1;
                self.ids.set(id, None)?;
                return Ok(Vec::new());
            }
        };

        // many subsequent hosts usually belong to the same domain
        if let Some(current) = self.current.as_deref().and_then(|key| self.queue.get_mut(key)) {
            if current.rev_name == rev_domain {
                current.add(id);
                return Ok(Vec::new());
            }
        }

        self.queue_domain(rev_domain, id)
    }

    /// Registered domain of a host, both in reverse domain name notation.
    fn domain_of(&self, rev_host: &str) -> Option<String> {
        let include_private = self.config.private_domains;
        if let Some(rev_domain) =
            registered_domain_reversed(&self.resolver, rev_host, true, include_private)
        {
            return Some(rev_domain);
        }
        if self.config.multi_part_suffixes_as_domains && rev_host.contains('.') {
            let host = reverse_host(rev_host);
            if self.resolver.is_public_suffix(&host, include_private) {
                info!("Accepting public suffix (containing dot) as domain: {}", host);
                return Some(rev_host.to_string());
            }
        }
        None
    }

    /// Flush all queued domains which are safe to output given the new domain,
    /// then add the host to the queued (possibly new) domain.
    fn queue_domain(&mut self, rev_domain: String, host_id: u64) -> Result<Vec<DomainVertex>> {
        let domain = Domain::from_rev_name(rev_domain);
        let mut flushed = Vec::new();
        // queued domains are sorted: once the first one is not safe to output,
        // none of the following ones is
        while let Some(ready) = self.queue.pop_safe(&domain.rev_name) {
            flushed.push(self.flush(ready)?);
        }
        let rev_name = domain.rev_name.clone();
        self.queue.get_or_insert(domain).add(host_id);
        self.current = Some(rev_name);
        self.stats.max_queue_used = self.queue.max_used();
        Ok(flushed)
    }

    /// Assign the next domain id and record it for all hosts of the domain.
    fn flush(&mut self, domain: Domain) -> Result<DomainVertex> {
        let id = self.stats.domains;
        self.stats.domains += 1;
        for &host_id in &domain.host_ids {
            self.ids.set(host_id, Some(id))?;
        }
        Ok(DomainVertex {
            id,
            host_count: self.config.count_hosts.then(|| domain.host_count()),
            rev_name: domain.rev_name,
        })
    }

    /// Flush the remaining queued domains and switch to the edge pass.
    pub fn finish_nodes(mut self) -> Result<(Vec<DomainVertex>, EdgeFolder<S>)> {
        let mut flushed = Vec::with_capacity(self.queue.len());
        while let Some(domain) = self.queue.pop_min() {
            flushed.push(self.flush(domain)?);
        }
        self.current = None;
        info!("Number of input lines: {}", self.stats.node_lines);
        info!("Number of domain nodes: {}", self.stats.domains);
        info!("Max. domain queue usage: {}", self.stats.max_queue_used);
        if self.stats.unmapped_hosts > 0 {
            info!("Hosts without domain: {}", self.stats.unmapped_hosts);
        }
        Ok((flushed, EdgeFolder::new(self.ids, self.stats)))
    }
}

/// Edge pass, reading the completed host-to-domain map.
pub struct EdgeFolder<S = FlatIds> {
    ids: S,
    last: Option<DomainEdge>,
    stats: FoldStats,
}

impl<S: IdStore> EdgeFolder<S> {
    fn new(ids: S, stats: FoldStats) -> Self {
        Self {
            ids,
            last: None,
            stats,
        }
    }

    pub fn stats(&self) -> &FoldStats {
        &self.stats
    }

    /// Source domain id of the last edge written.
    pub fn last_from(&self) -> Option<u64> {
        self.last.map(|edge| edge.from)
    }

    /// Domain id assigned to a host.
    pub fn domain_of(&self, host_id: u64) -> Result<Option<u64>> {
        self.ids.get(host_id)
    }

    /// Convert one edge line. Edges touching unmapped hosts, self-loops after
    /// folding and repetitions of the previous edge are dropped.
    pub fn convert_edge(&mut self, line: &str) -> Result<Option<DomainEdge>> {
        self.stats.edge_lines += 1;
        let (from, to) = match line.split_once('\t') {
            Some(parts) => parts,
            None => return Ok(None),
        };
        let from = self.ids.get(parse_id(from, line)?)?;
        let to = self.ids.get(parse_id(to, line)?)?;
        let edge = match (from, to) {
            (Some(from), Some(to)) if from != to => DomainEdge { from, to },
            _ => return Ok(None),
        };
        if self.last == Some(edge) {
            return Ok(None);
        }
        self.last = Some(edge);
        self.stats.edges_written += 1;
        Ok(Some(edge))
    }

    pub fn into_stats(self) -> FoldStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suffix::SuffixList;
    use id_map::{PagedIds, FLAT_ID_LIMIT};

    const LIST: &str = "com\norg\nac\ngov.ac\nno\nos.hordaland.no\n";

    fn folder(config: FoldConfig) -> Result<DomainFolder<SuffixList>> {
        DomainFolder::new(config, SuffixList::parse(LIST))
    }

    fn convert<S: IdStore>(
        mut folder: DomainFolder<SuffixList, S>,
        lines: &[&str],
    ) -> Result<(Vec<String>, EdgeFolder<S>)> {
        let mut out = Vec::new();
        for line in lines {
            out.extend(folder.convert_node(line)?.iter().map(ToString::to_string));
        }
        let (rest, edges) = folder.finish_nodes()?;
        out.extend(rest.iter().map(ToString::to_string));
        Ok((out, edges))
    }

    const SIMPLE: [&str; 4] = [
        "0\tcom.example",
        "1\tcom.example.www,",
        "2\tcom.example.xyz,",
        "3\torg.example",
    ];

    #[test]
    fn test_convert_nodes_simple() -> Result<()> {
        let (out, _) = convert(folder(FoldConfig::new(128))?, &SIMPLE)?;
        assert_eq!(out, vec!["0\tcom.example", "1\torg.example"]);
        Ok(())
    }

    #[test]
    fn test_convert_nodes_simple_count() -> Result<()> {
        let (out, _) = convert(folder(FoldConfig::new(128).with_count_hosts(true))?, &SIMPLE)?;
        assert_eq!(out, vec!["0\tcom.example\t3", "1\torg.example\t1"]);
        Ok(())
    }

    #[test]
    fn test_first_domain_flushed_when_next_arrives() -> Result<()> {
        let mut folder = folder(FoldConfig::new(8).with_count_hosts(true))?;
        assert!(folder.convert_node(SIMPLE[0])?.is_empty());
        assert!(folder.convert_node(SIMPLE[1])?.is_empty());
        let out = folder.convert_node(SIMPLE[3])?;
        assert_eq!(
            out,
            vec![DomainVertex {
                id: 0,
                rev_name: "com.example".to_string(),
                host_count: Some(2)
            }]
        );
        assert_eq!(folder.queue_len(), 1);
        Ok(())
    }

    #[test]
    fn test_unsorted_input_fails() -> Result<()> {
        let mut folder = folder(FoldConfig::new(8))?;
        assert!(folder.convert_node("0\tcom.example").is_ok());
        assert!(folder.convert_node("1\tcom.example.xyz").is_ok());
        let err = folder.convert_node("2\tcom.example.www");
        assert!(matches!(err, Err(FoldError::UnsortedInput { .. })));
        Ok(())
    }

    #[test]
    fn test_duplicate_host_fails() -> Result<()> {
        let mut folder = folder(FoldConfig::new(8))?;
        assert!(folder.convert_node("0\tcom.example").is_ok());
        assert!(matches!(
            folder.convert_node("1\tcom.example"),
            Err(FoldError::UnsortedInput { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_malformed_lines_are_skipped() -> Result<()> {
        let mut folder = folder(FoldConfig::new(8))?;
        assert!(folder.convert_node("no separator")?.is_empty());
        assert!(matches!(
            folder.convert_node("x\tcom.example"),
            Err(FoldError::InvalidId { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_host_beyond_capacity_fails() -> Result<()> {
        let mut folder = folder(FoldConfig::new(2))?;
        assert!(folder.convert_node("0\tcom.a").is_ok());
        // ids are written when the domain is flushed
        assert!(folder.convert_node("5\tcom.b").is_ok());
        let err = folder.convert_node("1\tcom.c");
        assert!(matches!(err, Err(FoldError::CapacityExceeded { id: 5, .. })));
        Ok(())
    }

    #[test]
    fn test_store_smaller_than_configured_capacity_fails() {
        let config = FoldConfig::new(16);
        let small = DomainFolder::with_store(
            config.clone(),
            SuffixList::parse(LIST),
            PagedIds::with_page_bits(8, 2),
        );
        assert!(matches!(
            small,
            Err(FoldError::StoreTooSmall {
                store: "paged",
                configured: 16,
                available: 8
            })
        ));
        let flat = DomainFolder::with_store(config, SuffixList::parse(LIST), FlatIds::with_capacity(16));
        assert!(flat.is_ok());
    }

    #[test]
    fn test_flat_store_rejects_capacity_beyond_limit() {
        // fails before allocating the map
        let folder: Result<DomainFolder<SuffixList>> =
            DomainFolder::new(FoldConfig::new(FLAT_ID_LIMIT + 1), SuffixList::parse(LIST));
        assert!(matches!(
            folder,
            Err(FoldError::StoreTooSmall {
                store: "flat",
                available: FLAT_ID_LIMIT,
                ..
            })
        ));
    }

    #[test]
    fn test_convert_edges() -> Result<()> {
        let nodes = [
            "0\tcom.example",
            "1\tcom.example.www",
            "2\tcom.other",
            "3\tinvalid.host",
            "4\torg.example",
        ];
        let (out, mut edges) = convert(folder(FoldConfig::new(8))?, &nodes)?;
        assert_eq!(out, vec!["0\tcom.example", "1\tcom.other", "2\torg.example"]);
        assert_eq!(edges.domain_of(3)?, None);

        let lines = [
            "0\t1", // self-loop after folding
            "0\t2",
            "0\t3", // unmapped target
            "1\t2", // same domain edge as before
            "1\t4",
            "2\t0",
            "3\t4", // unmapped source
            "no separator",
        ];
        let mut written = Vec::new();
        for line in lines {
            if let Some(edge) = edges.convert_edge(line)? {
                written.push(edge.to_string());
            }
        }
        assert_eq!(written, vec!["0\t1", "0\t2", "1\t0"]);
        assert_eq!(edges.last_from(), Some(1));

        let stats = edges.into_stats();
        assert_eq!(stats.domains, 3);
        assert_eq!(stats.unmapped_hosts, 1);
        assert_eq!(stats.edge_lines, 8);
        assert_eq!(stats.edges_written, 3);
        Ok(())
    }

    #[test]
    fn test_paged_store_gives_same_result() -> Result<()> {
        let config = FoldConfig::new(16).with_count_hosts(true);
        let paged = DomainFolder::with_store(
            config.clone(),
            SuffixList::parse(LIST),
            PagedIds::with_page_bits(16, 2),
        )?;
        let (flat_out, _) = convert(folder(config)?, &SIMPLE)?;
        let (paged_out, paged_edges) = convert(paged, &SIMPLE)?;
        assert_eq!(flat_out, paged_out);
        assert_eq!(paged_edges.domain_of(2)?, Some(0));
        assert_eq!(paged_edges.domain_of(3)?, Some(1));
        Ok(())
    }
}
