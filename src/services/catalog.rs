use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_default_from_null;

const CATALOG_SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResource {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogOrganization {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogMetrics {
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub followers: u64,
}

// One dataset entry as the open-data catalog returns it. Missing and null
// fields are common in practice, so everything defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDataset {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub organization: Option<CatalogOrganization>,
    #[serde(default)]
    pub resources: Vec<CatalogResource>,
    #[serde(default)]
    pub metrics: CatalogMetrics,
    #[serde(default)]
    pub page: String,
}

impl CatalogDataset {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn organization_name(&self) -> &str {
        self.organization.as_ref().map(|o| o.name.as_str()).unwrap_or("")
    }
}

#[derive(Deserialize)]
struct CatalogSearchResponse {
    #[serde(default)]
    data: Vec<CatalogDataset>,
}

#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    source_name: String,
    page_size: u32,
}

impl CatalogClient {
    pub fn new(base_url: String, source_name: String, page_size: u32) -> Self {
        CatalogClient {
            client: reqwest::Client::new(),
            base_url,
            source_name,
            page_size,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    // A catalog outage degrades discovery to an empty pool rather than
    // failing the request.
    pub async fn search(&self, keywords: &str) -> Vec<CatalogDataset> {
        let url = format!("{}/datasets/", self.base_url);
        let page_size = self.page_size.to_string();

        let request = self
            .client
            .get(&url)
            .query(&[
                ("q", keywords),
                ("page_size", page_size.as_str()),
                ("sort", "-followers"),
            ])
            .timeout(CATALOG_SEARCH_TIMEOUT)
            .send()
            .await;

        match request {
            Ok(response) => match response.error_for_status() {
                Ok(response) => match response.json::<CatalogSearchResponse>().await {
                    Ok(payload) => payload.data,
                    Err(e) => {
                        log::error!("Couldn't decode catalog search response: {:?}", e);
                        vec![]
                    }
                },
                Err(e) => {
                    log::error!("Catalog search returned an error status: {:?}", e);
                    vec![]
                }
            },
            Err(e) => {
                log::error!("Couldn't reach the catalog: {:?}", e);
                vec![]
            }
        }
    }

    pub async fn download(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
