use crate::core::{within, CallOptions, TABLE_DIRECTORY};
use crate::domain::model::{Table, VenueId};
use crate::domain::ports::TableDirectory;
use crate::utils::error::{BookingError, Result, ValidationRule};
use std::sync::Arc;

/// Finds the tables that can seat a party, in ascending id order.
#[derive(Clone)]
pub struct CapacityFilter {
    directory: Arc<dyn TableDirectory>,
}

impl CapacityFilter {
    pub fn new(directory: Arc<dyn TableDirectory>) -> Self {
        Self { directory }
    }

    pub async fn find_tables_with_capacity(
        &self,
        venue_id: &VenueId,
        party_size: u32,
        options: &CallOptions,
    ) -> Result<Vec<Table>> {
        if party_size < 1 {
            return Err(ValidationRule::PartySizeNotPositive.into());
        }

        let mut tables = within(
            TABLE_DIRECTORY,
            options,
            self.directory.list_tables_with_capacity(venue_id, party_size),
        )
        .await?
        .map_err(|e| {
            tracing::error!(venue = %venue_id, error = %e, "could not get tables with capacity");
            BookingError::unavailable(TABLE_DIRECTORY, e.to_string())
        })?;

        // The directory's ordering and filtering are not trusted.
        tables.retain(|t| t.seats(party_size));
        tables.sort_by_key(|t| t.id);
        tables.dedup_by_key(|t| t.id);

        tracing::debug!(venue = %venue_id, party_size, tables = tables.len(), "tables with capacity");
        Ok(tables)
    }
}
