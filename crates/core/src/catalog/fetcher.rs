//! Paginated activity listing.

use tracing::{debug, info};

use crate::config::CatalogConfig;
use crate::portal::{read_body, PortalError};
use crate::retry::{retry, RetryError, RetryPolicy};
use crate::session::Session;

use super::{ActivityPage, Catalog, CatalogError};

/// Fetches and merges every page of the activity listing.
pub struct CatalogFetcher {
    list_url: String,
    page_size: u32,
    retry_policy: RetryPolicy,
}

impl CatalogFetcher {
    pub fn new(
        list_url: impl Into<String>,
        config: &CatalogConfig,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            list_url: list_url.into(),
            page_size: config.page_size.max(1),
            retry_policy,
        }
    }

    async fn fetch_page(
        &self,
        session: &Session,
        page_index: u64,
    ) -> Result<ActivityPage, CatalogError> {
        let page_index = page_index.to_string();
        let page_size = self.page_size.to_string();
        let form = [
            ("pageIndex", page_index.as_str()),
            ("pageSize", page_size.as_str()),
            ("sortField", ""),
            ("sortOrder", ""),
        ];

        let response = session
            .client()
            .post(&self.list_url)
            .form(&form)
            .send()
            .await
            .map_err(PortalError::from)?;
        let body = read_body(response).await?;

        serde_json::from_str(&body).map_err(|_| {
            CatalogError::Portal(PortalError::parse(
                "activity page is not valid JSON",
                &body,
            ))
        })
    }

    /// Fetch every page. Totals may drift between pages; this is best effort.
    pub async fn fetch_all(&self, session: &Session) -> Result<Catalog, CatalogError> {
        // the first GET lets the portal finish its SSO redirects and set app cookies
        session
            .client()
            .get(&self.list_url)
            .send()
            .await
            .map_err(PortalError::from)?;

        let mut catalog = Catalog::new();
        let mut page_index = 1;
        loop {
            let page = self.fetch_page(session, page_index).await?;
            let received = page.datas.len();
            let added = catalog.extend(page.datas);
            debug!(
                page = page.page_index,
                received,
                added,
                total = page.total,
                "Fetched activity page"
            );

            if received == 0 {
                break;
            }
            let page_size = if page.page_size == 0 {
                self.page_size as u64
            } else {
                page.page_size
            };
            if page.page_index.saturating_mul(page_size) >= page.total {
                break;
            }
            page_index = page.page_index.max(page_index) + 1;
        }

        info!(activities = catalog.len(), "Catalog fetched");
        Ok(catalog)
    }

    /// Fetch every page, retrying the whole listing on transient failures.
    pub async fn fetch_all_with_retry(
        &self,
        session: &Session,
    ) -> Result<Catalog, RetryError<CatalogError>> {
        retry(&self.retry_policy, "catalog", |_| self.fetch_all(session)).await
    }
}
