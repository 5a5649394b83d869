use serde::{Deserialize, Serialize};
use tracing::info;

use crate::folder::id_map::FLAT_ID_LIMIT;

/// Options of a host-to-domain folding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldConfig {
    /// Add the number of hosts per domain as third vertex column.
    pub count_hosts: bool,
    /// Also apply suffixes from the PRIVATE division of the public suffix list.
    pub private_domains: bool,
    /// Map host names equal to a multi-part public suffix (e.g. `gov.uk`)
    /// to a domain of their own.
    pub multi_part_suffixes_as_domains: bool,
    /// Host vertex capacity: every host id must be below this value.
    pub max_host_id: u64,
}

impl FoldConfig {
    pub fn new(max_host_id: u64) -> Self {
        Self {
            max_host_id,
            ..Self::default()
        }
    }

    pub fn with_count_hosts(mut self, count_hosts: bool) -> Self {
        self.count_hosts = count_hosts;
        self
    }

    pub fn with_private_domains(mut self, private_domains: bool) -> Self {
        self.private_domains = private_domains;
        self
    }

    pub fn with_multi_part_suffixes_as_domains(mut self, include: bool) -> Self {
        self.multi_part_suffixes_as_domains = include;
        self
    }

    /// Whether the host-to-domain map needs the paged backing.
    pub fn needs_paged_ids(&self) -> bool {
        self.max_host_id > FLAT_ID_LIMIT
    }

    pub fn log_summary(&self, store_kind: &str) {
        info!(
            "Host-to-domain folding with {} host vertices ({} id map)",
            self.max_host_id, store_kind
        );
        info!(
            " - map to {} domains",
            if self.private_domains { "private" } else { "ICANN" }
        );
        info!(
            " - {}multi-part public suffixes as domains",
            if self.multi_part_suffixes_as_domains { "" } else { "no " }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = FoldConfig::new(128)
            .with_count_hosts(true)
            .with_multi_part_suffixes_as_domains(true);
        assert_eq!(config.max_host_id, 128);
        assert!(config.count_hosts);
        assert!(!config.private_domains);
        assert!(config.multi_part_suffixes_as_domains);
        assert!(!config.needs_paged_ids());
        assert!(FoldConfig::new(FLAT_ID_LIMIT + 1).needs_paged_ids());
    }

    #[test]
    fn test_deserialize_partial() -> anyhow::Result<()> {
        let config: FoldConfig = serde_json::from_str(r#"{"count_hosts": true, "max_host_id": 10}"#)?;
        assert_eq!(config, FoldConfig::new(10).with_count_hosts(true));
        Ok(())
    }
}
