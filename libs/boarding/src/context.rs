//! Context shared across boarding checks (C12 §4.12).

use std::time::Duration;

use provisioner_catalog::CatalogSnapshot;
use provisioner_domain::ServerRecord;
use provisioner_ipmi::{IpmiAdapter, IpmiCredentials};

/// Everything a boarding check needs: the persisted server record (the
/// source of truth for what provisioning already claimed to have done),
/// an optional catalog snapshot for device-type lookups, and optional
/// live adapters for checks that re-probe rather than trust the record.
pub struct BoardingContext<'a> {
    pub server: ServerRecord,
    pub catalog: Option<&'a CatalogSnapshot>,
    pub ipmi: Option<(&'a IpmiAdapter, &'a IpmiCredentials)>,
    pub ssh_probe_timeout: Duration,
}

impl<'a> BoardingContext<'a> {
    #[must_use]
    pub fn new(server: ServerRecord) -> Self {
        Self {
            server,
            catalog: None,
            ipmi: None,
            ssh_probe_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: &'a CatalogSnapshot) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn with_ipmi(mut self, ipmi: &'a IpmiAdapter, credentials: &'a IpmiCredentials) -> Self {
        self.ipmi = Some((ipmi, credentials));
        self
    }
}
