use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::{Mutex, mpsc},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    core::Shutdowner,
    domain::{fetcher::RequestFetcher, models::InboundRequest},
};

const CHANNEL_CAPACITY: usize = 100;

/// Reads newline-delimited requests. Blank lines are skipped.
#[non_exhaustive]
pub struct LineFetcher<R> {
    reader: Mutex<Option<R>>,
    cancel_token: CancellationToken,
}

impl LineFetcher<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R> LineFetcher<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self::with_cancel_token(reader, CancellationToken::new())
    }

    pub fn with_cancel_token(reader: R, cancel_token: CancellationToken) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            cancel_token,
        }
    }
}

#[async_trait]
impl<R> Shutdowner for LineFetcher<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn shutdown(&self) -> anyhow::Result<()> {
        self.cancel_token.cancel();
        Ok(())
    }
}

impl<R> Drop for LineFetcher<R> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[async_trait]
impl<R> RequestFetcher for LineFetcher<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn fetch(&self) -> mpsc::Receiver<InboundRequest> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let Some(reader) = self.reader.lock().await.take() else {
            warn!("fetcher already started, returning a closed channel");
            return rx;
        };

        let cancellation_token = self.cancel_token.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                tokio::select! {
                    biased;

                    _ = cancellation_token.cancelled() => {
                        info!("fetcher cancelled, stopping...");
                        break
                    }

                    maybe_line = lines.next_line() => {
                        match maybe_line {
                            Ok(Some(line)) if line.trim().is_empty() => continue,
                            Ok(Some(line)) => {
                                if tx.send(line.into()).await.is_err() {
                                    info!("receiver dropped");
                                    break;
                                }
                            }
                            Ok(None) => {
                                info!("input closed");
                                break;
                            }
                            Err(e) => {
                                error!("failed to read input: {e}");
                                break;
                            }
                        }
                    }
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use std::{
        pin::Pin,
        task::{Context, Poll},
        time::Duration,
    };

    use pretty_assertions::assert_eq;
    use tokio::{io::ReadBuf, time::timeout};

    use super::*;

    #[tokio::test]
    async fn test_lines_are_forwarded_until_eof() {
        let fetcher = LineFetcher::new(&b"first\n\n  \nsecond\n"[..]);

        let mut rx = fetcher.fetch().await;

        assert_eq!(rx.recv().await, Some(InboundRequest::from("first".to_string())));
        assert_eq!(rx.recv().await, Some(InboundRequest::from("second".to_string())));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_second_fetch_gets_a_closed_channel() {
        let fetcher = LineFetcher::new(&b"only\n"[..]);
        let _first = fetcher.fetch().await;

        let mut second = fetcher.fetch().await;

        assert_eq!(second.recv().await, None);
    }

    #[tokio::test]
    async fn test_shutdown_stops_reading() {
        let (_writer, reader) = tokio::io::duplex(64);
        let fetcher = LineFetcher::new(reader);
        let mut rx = fetcher.fetch().await;

        fetcher.shutdown().await.unwrap();

        assert_eq!(rx.recv().await, None);
    }

    /// Input that stays open and never yields a byte.
    struct Silent;

    impl AsyncRead for Silent {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Pending
        }
    }

    #[tokio::test]
    async fn test_shutdown_closes_channel_of_idle_input() {
        let fetcher = LineFetcher::new(Silent);
        let mut rx = fetcher.fetch().await;

        fetcher.shutdown().await.unwrap();

        let closed = timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(closed, Ok(None));
    }
}
