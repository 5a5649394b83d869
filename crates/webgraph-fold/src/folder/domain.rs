//! Domains collected while folding hosts, and the queue holding them until
//! they can be written in sorted order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

const HYPHEN: u8 = b'-';
const DOT: u8 = b'.';

/// A domain as the result of folding one or more host names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub rev_name: String,
    pub host_ids: Vec<u64>,
}

impl Domain {
    /// Domain given in reverse domain name notation.
    pub fn from_rev_name(rev_name: String) -> Self {
        Self {
            rev_name,
            host_ids: Vec::new(),
        }
    }

    pub fn add(&mut self, host_id: u64) {
        self.host_ids.push(host_id);
    }

    pub fn host_count(&self) -> u64 {
        self.host_ids.len() as u64
    }

    /// Whether this domain is safe to output once `next_rev_name` has been seen.
    pub fn is_safe_to_output(&self, next_rev_name: &str) -> bool {
        is_safe_to_output(&self.rev_name, next_rev_name)
    }
}

impl PartialOrd for Domain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Domain {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rev_name.cmp(&other.rev_name)
    }
}

/// A queued domain `rev_name` may be assigned its id once the reversed domain
/// name `next_rev_name`, seen later in the sorted host input, can no longer
/// sort before it or extend it.
pub fn is_safe_to_output(rev_name: &str, next_rev_name: &str) -> bool {
    compare_rev_domains_safe(rev_name, next_rev_name) < 0
}

/// Compare two reversed domain names, returning 0 ("undecided") whenever a
/// hyphen or a second dot in the shared prefix, or a hyphen or dot right after
/// it, leaves the domain boundary ambiguous.
pub fn compare_rev_domains_safe(d1: &str, d2: &str) -> i32 {
    let (b1, b2) = (d1.as_bytes(), d2.as_bytes());
    let (l1, l2) = (b1.len(), b2.len());
    let mut dots = 0;
    for (&c1, &c2) in b1.iter().zip(b2.iter()) {
        if c1 != c2 {
            return i32::from(c1) - i32::from(c2);
        } else if c1 == HYPHEN {
            // cannot finish "org.example-domain" unless "org.example" is done
            return 0;
        } else if c1 == DOT {
            dots += 1;
            if dots > 1 {
                // Multi-part suffixes where the first part is a suffix too: if
                // "a" and "a.b.c" are suffixes and the hosts are "a.b.c.d",
                // "a.b.c.e", "a.b.f", then "a.b.c.*" must wait for "a.b".
                return 0;
            }
        }
    }
    match l1.cmp(&l2) {
        Ordering::Equal => 0,
        Ordering::Greater => match b1[l2] {
            // "org.example-domain" or "tld.suffix.suffix2.domain" must wait
            // for "org.example" or "tld.suffix"
            HYPHEN | DOT => 1,
            c1 => i32::from(c1) - i32::from(DOT),
        },
        Ordering::Less => match b2[l1] {
            HYPHEN | DOT => 1,
            c2 => i32::from(DOT) - i32::from(c2),
        },
    }
}

/// Domains not yet flushed, ordered by reversed name.
#[derive(Debug, Default)]
pub struct DomainQueue {
    domains: BTreeMap<String, Domain>,
    max_used: usize,
}

impl DomainQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Maximum number of domains queued at the same time.
    pub fn max_used(&self) -> usize {
        self.max_used
    }

    pub fn peek_min_key(&self) -> Option<&str> {
        self.domains.keys().next().map(String::as_str)
    }

    pub fn pop_min(&mut self) -> Option<Domain> {
        self.domains.pop_first().map(|(_, domain)| domain)
    }

    pub fn get_mut(&mut self, rev_name: &str) -> Option<&mut Domain> {
        self.domains.get_mut(rev_name)
    }

    /// Fetch the queued domain with the reversed name of `domain`, or queue a new one.
    pub fn get_or_insert(&mut self, domain: Domain) -> &mut Domain {
        if !self.domains.contains_key(&domain.rev_name) {
            self.max_used = self.max_used.max(self.domains.len() + 1);
        }
        self.domains.entry(domain.rev_name.clone()).or_insert(domain)
    }

    /// Pop domains from the front of the queue while they are safe to output
    /// given `next_rev_name`.
    pub fn pop_safe(&mut self, next_rev_name: &str) -> Option<Domain> {
        match self.peek_min_key() {
            Some(first) if is_safe_to_output(first, next_rev_name) => self.pop_min(),
            _ => None,
        }
    }
}
