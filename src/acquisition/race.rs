//! First-settled-wins race between the load and download signals.

use crate::error::{AcquisitionError, Stage};
use crate::renderer::{NavigationSignals, PendingDownload};
use futures::future::{self, Either};
use std::future::Future;
use std::time::Duration;

/// Which signal settled first.
pub enum Settled {
    Loaded,
    Downloaded(Box<dyn PendingDownload>),
}

impl Settled {
    pub fn is_download(&self) -> bool {
        matches!(self, Settled::Downloaded(_))
    }
}

impl std::fmt::Debug for Settled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Settled::Loaded => f.write_str("Loaded"),
            Settled::Downloaded(d) => write!(f, "Downloaded({:?})", d.suggested_filename()),
        }
    }
}

/// Wait for the first signal to fire successfully.
///
/// A signal whose source fails does not win; the other one is awaited
/// instead. The loser is dropped, unsubscribing it; whatever it would
/// have produced is discarded.
pub async fn first_settled(signals: NavigationSignals) -> Result<Settled, AcquisitionError> {
    match future::select(signals.load, signals.download).await {
        Either::Left((Ok(()), _download)) => Ok(Settled::Loaded),
        Either::Right((Ok(download), _load)) => Ok(Settled::Downloaded(download)),
        Either::Left((Err(load), download)) => match download.await {
            Ok(download) => Ok(Settled::Downloaded(download)),
            Err(download) => Err(AcquisitionError::SignalsLost { load, download }),
        },
        Either::Right((Err(download), load)) => match load.await {
            Ok(()) => Ok(Settled::Loaded),
            Err(load) => Err(AcquisitionError::SignalsLost { load, download }),
        },
    }
}

/// Await `fut`, failing with `Timeout` after `limit`. `None` waits forever.
pub async fn bounded<T, F>(
    limit: Option<Duration>,
    stage: Stage,
    fut: F,
) -> Result<T, AcquisitionError>
where
    F: Future<Output = Result<T, AcquisitionError>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| AcquisitionError::Timeout { stage, after })?,
        None => fut.await,
    }
}
