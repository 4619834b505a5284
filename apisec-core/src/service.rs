//! The management-service capability consumed by the reconciler.

use crate::error::ServiceError;
use crate::types::{ApiSpec, ExistingInventory, RemoteId};

/// Remote inventory of protected APIs.
///
/// Every call is a bounded request/response; implementations map transport
/// failures, timeouts, non-success statuses and undecodable bodies onto
/// [`ServiceError`] and never panic.
pub trait ManagementService {
    /// Read the full inventory, keyed by identity.
    fn list(&self) -> Result<ExistingInventory, ServiceError>;

    /// Start protecting a new API.
    fn create(&self, spec: &ApiSpec) -> Result<(), ServiceError>;

    /// Replace the specification of an already protected API.
    fn update(&self, id: &RemoteId, spec: &ApiSpec) -> Result<(), ServiceError>;

    /// Stop protecting an API.
    fn delete(&self, id: &RemoteId) -> Result<(), ServiceError>;
}
