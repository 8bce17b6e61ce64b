use crate::domain::model::{Table, TableId, VenueId};
use crate::domain::ports::TableDirectory;
use crate::utils::error::DirectoryError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// Table directory backed by the venue table API.
#[derive(Debug, Clone)]
pub struct HttpTableDirectory {
    client: Client,
    root: String,
}

impl HttpTableDirectory {
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_client(Client::new(), root)
    }

    pub fn with_client(client: Client, root: impl Into<String>) -> Self {
        Self {
            client,
            root: root.into().trim_end_matches('/').to_string(),
        }
    }

    fn tables_url(&self, venue_id: &VenueId) -> String {
        format!("{}/venues/{}/tables", self.root, venue_id)
    }
}

#[async_trait]
impl TableDirectory for HttpTableDirectory {
    async fn list_tables_with_capacity(
        &self,
        venue_id: &VenueId,
        min_capacity: u32,
    ) -> Result<Vec<Table>, DirectoryError> {
        let url = format!("{}/capacity/{}", self.tables_url(venue_id), min_capacity);
        tracing::debug!("Making API request to: {}", url);

        let response = self.client.get(&url).send().await?;
        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(DirectoryError::Status {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<Vec<Table>>().await?)
    }

    async fn get_table(
        &self,
        venue_id: &VenueId,
        table_id: TableId,
    ) -> Result<Option<Table>, DirectoryError> {
        let url = format!("{}/{}", self.tables_url(venue_id), table_id);
        tracing::debug!("Making API request to: {}", url);

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<Table>().await?)),
            status => Err(DirectoryError::Status {
                status: status.as_u16(),
            }),
        }
    }
}
