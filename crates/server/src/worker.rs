//! Organize-queue consumer.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use docshelf_core::FileRecord;
use docshelf_pipeline::Organizer;

/// Drain the organize queue, filing each record as it arrives.
///
/// Runs until `cancel` fires or every sender is gone. Per-file failures are
/// folded into the outcome by the organizer and never stop the loop.
pub async fn organize_queue(
    organizer: Arc<Organizer>,
    mut queue: mpsc::Receiver<FileRecord>,
    cancel: CancellationToken,
) {
    loop {
        let file = tokio::select! {
            () = cancel.cancelled() => break,
            file = queue.recv() => match file {
                Some(file) => file,
                None => break,
            },
        };

        let outcome = organizer.organize_file(&file, false).await;
        debug!(file = %file.name, ?outcome, "queued file processed");
    }

    info!("organize worker stopped");
}
