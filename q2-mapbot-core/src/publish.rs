//! Serialised add → commit → push of staged content.
//!
//! Every ingestion event that accepted at least one file becomes exactly one
//! [`PublishTransaction`]. Transactions from concurrent events are run one at a time so
//! their stage and commit steps never interleave.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::contract::{PublishTransaction, Repository};
use crate::error::PublishError;
use crate::stage::StagingResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing was accepted, so no transaction was started.
    Skipped,
    Published { files: usize },
}

pub struct PublishCoordinator {
    repository: Arc<dyn Repository>,
    lock: Mutex<()>,
}

impl PublishCoordinator {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self {
            repository,
            lock: Mutex::new(()),
        }
    }

    pub async fn publish(
        &self,
        result: &StagingResult,
        message: &str,
    ) -> Result<PublishOutcome, PublishError> {
        if result.files_accepted == 0 {
            debug!(message, "No staged files, skipping publish");
            return Ok(PublishOutcome::Skipped);
        }

        let transaction = PublishTransaction {
            message: message.to_string(),
            paths: result.destination_paths.iter().cloned().collect(),
        };

        let _guard = self.lock.lock().await;
        info!(files = transaction.paths.len(), message, "Publishing staged content");
        match self.repository.publish(&transaction).await {
            Ok(()) => {
                info!(files = transaction.paths.len(), "Publish transaction complete");
                Ok(PublishOutcome::Published {
                    files: transaction.paths.len(),
                })
            }
            Err(e) => {
                error!(step = %e.step, error = %e, message, "Publish transaction failed");
                Err(e)
            }
        }
    }
}
