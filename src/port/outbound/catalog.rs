//! Site catalog port.
//!
//! Vendor site metadata is owned by a site-management collaborator. The core
//! only reads it.

use async_trait::async_trait;

use crate::domain::{SiteDescriptor, SiteId};
use crate::error::Result;

/// Read-only source of vendor site descriptors.
#[async_trait]
pub trait SiteCatalog: Send + Sync {
    /// Every known site, scannable or not.
    async fn list(&self) -> Result<Vec<SiteDescriptor>>;

    /// Sites a scan should fan out to: active and not marked not-working.
    async fn scannable(&self) -> Result<Vec<SiteDescriptor>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(SiteDescriptor::is_scannable)
            .collect())
    }

    /// Resolve a selection of site ids, keeping only scannable ones.
    ///
    /// Unknown ids are reported as [`crate::error::Error::NotFound`].
    async fn select(&self, ids: &[SiteId]) -> Result<Vec<SiteDescriptor>> {
        let all = self.list().await?;
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            let site = all
                .iter()
                .find(|s| &s.id == id)
                .ok_or_else(|| crate::error::Error::NotFound {
                    entity: "site",
                    id: id.to_string(),
                })?;
            if site.is_scannable() {
                selected.push(site.clone());
            }
        }
        Ok(selected)
    }
}
