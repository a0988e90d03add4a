//! Out-of-band document notifications.
//!
//! The server pushes unsolicited file-record updates (stage transitions,
//! deletions) over a realtime channel outside the upload flow. Whatever owns
//! that connection feeds the payloads into an mpsc channel; the listener
//! applies them to the file mirror. Active upload jobs are never touched.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use corpora_core::models::DocumentNotification;

use crate::repository::FileRepository;

pub struct NotificationListener {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl NotificationListener {
    /// Spawn the listener task. It runs until the channel closes or
    /// [`shutdown`](Self::shutdown) is called.
    pub fn spawn(
        files: Arc<FileRepository>,
        mut rx: mpsc::Receiver<DocumentNotification>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    notification = rx.recv() => match notification {
                        Some(notification) => {
                            tracing::debug!(?notification, "Applying document notification");
                            files.apply(notification).await;
                        }
                        None => break,
                    },
                }
            }
        });

        Self { cancel, handle }
    }

    /// Stop the listener and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}
