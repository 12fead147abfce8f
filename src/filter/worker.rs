use log::{debug, warn};
use std::sync::mpsc;
use std::thread::JoinHandle;

use super::{AdaptiveFilter, FilterError, FilterInitError, FilterProvider};

enum FilterRequest {
    Apply { sample: i16, training: bool },
    Shutdown,
}

enum FilterResponse {
    Ready(Result<(), FilterInitError>),
    Filtered(i16),
    Failed(FilterError),
}

/// Runs another provider's filter on a dedicated thread.
///
/// The inner filter is created on the worker thread, so it does not need to
/// be `Send`. Each `apply` is a blocking round trip over a channel.
#[derive(Debug, Clone, Default)]
pub struct FilterWorker<P> {
    inner: P,
}

impl<P> FilterWorker<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P> FilterProvider for FilterWorker<P>
where
    P: FilterProvider + Clone + Send + 'static,
{
    type Filter = RemoteFilter;

    fn init(&self) -> Result<RemoteFilter, FilterInitError> {
        let (req_tx, resp_rx, handle) = spawn_filter_thread(self.inner.clone())?;

        match resp_rx.recv() {
            Ok(FilterResponse::Ready(Ok(()))) => {
                debug!("Filter worker ready");
                Ok(RemoteFilter {
                    req_tx,
                    resp_rx,
                    handle: Some(handle),
                    processed: 0,
                })
            }
            Ok(FilterResponse::Ready(Err(e))) => {
                let _ = handle.join();
                Err(e)
            }
            Ok(FilterResponse::Filtered(_) | FilterResponse::Failed(_)) => Err(
                FilterInitError::Worker("unexpected response before ready".to_string()),
            ),
            Err(_) => {
                let _ = handle.join();
                Err(FilterInitError::Worker(
                    "worker exited during initialization".to_string(),
                ))
            }
        }
    }
}

fn spawn_filter_thread<P>(
    provider: P,
) -> Result<
    (
        mpsc::Sender<FilterRequest>,
        mpsc::Receiver<FilterResponse>,
        JoinHandle<()>,
    ),
    FilterInitError,
>
where
    P: FilterProvider + Send + 'static,
{
    let (req_tx, req_rx) = mpsc::channel::<FilterRequest>();
    let (resp_tx, resp_rx) = mpsc::channel::<FilterResponse>();

    let handle = std::thread::Builder::new()
        .name("nross-filter".to_string())
        .spawn(move || {
            let mut filter = match provider.init() {
                Ok(filter) => {
                    let _ = resp_tx.send(FilterResponse::Ready(Ok(())));
                    filter
                }
                Err(e) => {
                    let _ = resp_tx.send(FilterResponse::Ready(Err(e)));
                    return;
                }
            };

            while let Ok(request) = req_rx.recv() {
                match request {
                    FilterRequest::Apply { sample, training } => {
                        let y = match filter.apply(sample, training) {
                            Ok(y) => y,
                            Err(e) => {
                                warn!("Filter worker stopping: {}", e);
                                let _ = resp_tx.send(FilterResponse::Failed(e));
                                break;
                            }
                        };
                        if resp_tx.send(FilterResponse::Filtered(y)).is_err() {
                            break;
                        }
                    }
                    FilterRequest::Shutdown => {
                        break;
                    }
                }
            }
        })
        .map_err(|e| FilterInitError::Worker(e.to_string()))?;

    Ok((req_tx, resp_rx, handle))
}

/// Client half of a [`FilterWorker`]. Dropping it shuts the worker down.
pub struct RemoteFilter {
    req_tx: mpsc::Sender<FilterRequest>,
    resp_rx: mpsc::Receiver<FilterResponse>,
    handle: Option<JoinHandle<()>>,
    processed: usize,
}

impl AdaptiveFilter for RemoteFilter {
    fn apply(&mut self, sample: i16, training: bool) -> Result<i16, FilterError> {
        let disconnected = FilterError::Disconnected {
            processed: self.processed,
        };
        self.req_tx
            .send(FilterRequest::Apply { sample, training })
            .map_err(|_| disconnected)?;

        match self.resp_rx.recv() {
            Ok(FilterResponse::Filtered(y)) => {
                self.processed += 1;
                Ok(y)
            }
            Ok(FilterResponse::Failed(e)) => Err(e),
            _ => Err(FilterError::Disconnected {
                processed: self.processed,
            }),
        }
    }
}

impl Drop for RemoteFilter {
    fn drop(&mut self) {
        let _ = self.req_tx.send(FilterRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Filter worker panicked");
            }
        }
    }
}
