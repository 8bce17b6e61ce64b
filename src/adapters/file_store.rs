use crate::domain::model::{Booking, BookingFilter, BookingId, ProposedBooking, VenueId};
use crate::domain::ports::BookingStore;
use crate::utils::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct BookingsDocument {
    last_id: u64,
    bookings: Vec<Booking>,
}

/// Exclusive advisory lock on the sidecar `<document>.lock` file.
/// Released when dropped.
struct DocumentLock {
    file: File,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "could not release bookings lock");
        }
    }
}

/// Bookings kept in a single JSON document on local disk.
///
/// Mutations run load-check-save while holding an OS advisory lock on a
/// sidecar file, so separate processes (or separate handles in one process)
/// sharing the document serialize their writes. Each save goes to its own
/// staging file in the same directory and is renamed over the document;
/// readers see either the old or the new state.
#[derive(Debug)]
pub struct JsonFileBookingStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileBookingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    async fn lock(&self) -> Result<DocumentLock, StoreError> {
        let directory = self.directory();
        let lock_path = self.lock_path();

        tokio::task::spawn_blocking(move || -> Result<DocumentLock, StoreError> {
            std::fs::create_dir_all(&directory)?;
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)?;
            FileExt::lock_exclusive(&file)?;
            Ok(DocumentLock { file })
        })
        .await
        .map_err(|e| StoreError::Backend {
            message: format!("lock task failed: {}", e),
        })?
    }

    async fn load(&self) -> Result<BookingsDocument, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(data) if data.is_empty() => Ok(BookingsDocument::default()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BookingsDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Callers hold the document lock.
    async fn save(&self, document: &BookingsDocument) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(document)?;
        let directory = self.directory();
        let path = self.path.clone();

        let written = tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
            std::fs::create_dir_all(&directory)?;
            let mut staging = NamedTempFile::new_in(&directory)?;
            staging.write_all(&data)?;
            staging.as_file().sync_all()?;
            staging.persist(&path).map_err(|e| e.error)?;
            Ok(data.len())
        })
        .await
        .map_err(|e| StoreError::Backend {
            message: format!("write task failed: {}", e),
        })??;

        tracing::debug!(path = %self.path.display(), bytes = written, "bookings written");
        Ok(())
    }
}

#[async_trait]
impl BookingStore for JsonFileBookingStore {
    async fn query_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let document = self.load().await?;
        Ok(document
            .bookings
            .into_iter()
            .filter(|b| filter.matches(b))
            .collect())
    }

    async fn insert_booking(&self, booking: ProposedBooking) -> Result<Booking, StoreError> {
        let _held = self.guard.lock().await;
        let _locked = self.lock().await?;
        let mut document = self.load().await?;

        if let Some(clash) = document.bookings.iter().find(|b| b.clashes_with(&booking)) {
            return Err(StoreError::Exclusion { existing: clash.id });
        }

        document.last_id += 1;
        let booking = booking.into_booking(BookingId(document.last_id));
        document.bookings.push(booking.clone());
        self.save(&document).await?;
        Ok(booking)
    }

    async fn delete_bookings(&self, ids: &[BookingId]) -> Result<Vec<BookingId>, StoreError> {
        let _held = self.guard.lock().await;
        let _locked = self.lock().await?;
        let mut document = self.load().await?;

        let removed: Vec<BookingId> = document
            .bookings
            .iter()
            .map(|b| b.id)
            .filter(|id| ids.contains(id))
            .collect();
        if removed.is_empty() {
            return Ok(removed);
        }

        document.bookings.retain(|b| !removed.contains(&b.id));
        self.save(&document).await?;
        Ok(removed)
    }

    async fn bookings_on_date(
        &self,
        venue_id: &VenueId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        let document = self.load().await?;
        Ok(document
            .bookings
            .into_iter()
            .filter(|b| &b.venue_id == venue_id && b.date == date)
            .collect())
    }
}
