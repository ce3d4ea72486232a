//! Database layer (Firestore, plus an in-memory store for tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::{MemoryDb, StoreOp};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{RegionDocument, UserRecord};

/// Stream of pushed snapshots. Dropping the receiver ends the subscription
/// and releases the remote listener.
pub type Snapshots<T> = mpsc::UnboundedReceiver<T>;

/// Remote document store holding regions and user verification records.
#[async_trait]
pub trait RegionStore: Send + Sync {
    async fn get_region(&self, id: &str) -> Result<Option<RegionDocument>>;

    async fn list_regions(&self) -> Result<Vec<RegionDocument>>;

    /// Subscribe to the regions collection. The current contents are pushed
    /// first, then the full collection again after every change.
    async fn watch_regions(&self) -> Result<Snapshots<Vec<RegionDocument>>>;

    /// Write a new region under a generated ID and return that ID.
    async fn create_region(&self, doc: &RegionDocument) -> Result<String>;

    /// Create or fully replace the region stored under `id`.
    async fn replace_region(&self, id: &str, doc: &RegionDocument) -> Result<()>;

    async fn delete_region(&self, id: &str) -> Result<()>;

    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn create_user(&self, email: &str, record: &UserRecord) -> Result<()>;

    /// Subscribe to one user's record; `None` is pushed while it is absent.
    async fn watch_user(&self, email: &str) -> Result<Snapshots<Option<UserRecord>>>;
}
