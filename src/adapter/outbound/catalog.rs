//! Site catalog backed by the `[[sites]]` configuration table.

use async_trait::async_trait;

use crate::domain::SiteDescriptor;
use crate::error::Result;
use crate::port::SiteCatalog;

/// In-memory catalog of site descriptors.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteCatalog {
    sites: Vec<SiteDescriptor>,
}

impl StaticSiteCatalog {
    #[must_use]
    pub fn new(sites: Vec<SiteDescriptor>) -> Self {
        Self { sites }
    }
}

#[async_trait]
impl SiteCatalog for StaticSiteCatalog {
    async fn list(&self) -> Result<Vec<SiteDescriptor>> {
        Ok(self.sites.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParseMethod, SiteId, SiteType};
    use crate::error::Error;

    fn catalog() -> StaticSiteCatalog {
        StaticSiteCatalog::new(vec![
            SiteDescriptor::new("a", "A", "https://a.example", ParseMethod::Shopify),
            SiteDescriptor::new("b", "B", "https://b.example", ParseMethod::F2f).with_active(false),
            SiteDescriptor::new("c", "C", "https://c.example", ParseMethod::Other)
                .with_site_type(SiteType::NotWorking),
        ])
    }

    #[tokio::test]
    async fn scannable_skips_inactive_and_not_working() {
        let sites = catalog().scannable().await.unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, SiteId::from("a"));
    }

    #[tokio::test]
    async fn select_reports_unknown_ids() {
        let catalog = catalog();
        let picked = catalog
            .select(&[SiteId::from("a"), SiteId::from("b")])
            .await
            .unwrap();
        assert_eq!(picked.len(), 1);

        let err = catalog.select(&[SiteId::from("zzz")]).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "site", .. }));
    }
}
