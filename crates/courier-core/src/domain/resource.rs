use std::path::{Path, PathBuf};

use super::ids::{AttemptId, ResourceId};
use super::reference::BlobReference;

/// A blob downloaded to local disk, owned by one processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    id: ResourceId,
    reference: BlobReference,
    local_path: PathBuf,
    attempt: AttemptId,
}

impl FetchedResource {
    pub fn new(
        id: ResourceId,
        reference: BlobReference,
        local_path: PathBuf,
        attempt: AttemptId,
    ) -> Self {
        Self {
            id,
            reference,
            local_path,
            attempt,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn reference(&self) -> &BlobReference {
        &self.reference
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }
}
