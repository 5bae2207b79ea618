//! Multipart upload with observable progress.
//!
//! Progress is a lazy stream of cumulative fractions fed from the chunked
//! request body, so callers can observe transfer progress without hooks
//! into the transport layer.

use crate::client::fetch::ApiClient;
use crate::error::{ApiError, Result};
use crate::types::{ApiRequest, RequestBody};
use bytes::Bytes;
use futures::Stream;
use http::Method;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream of cumulative upload fractions in `0.0..=1.0`. Ends when the
/// request body has been fully handed to the transport.
///
/// The receiver is boxed because `async_channel::Receiver` is `!Unpin`;
/// pinning it once up front keeps the `Stream` impl free of projection.
pub struct UploadProgress {
    receiver: Pin<Box<async_channel::Receiver<f32>>>,
}

impl UploadProgress {
    pub async fn next(&mut self) -> Option<f32> {
        self.receiver.recv().await.ok()
    }
}

impl Stream for UploadProgress {
    type Item = f32;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.as_mut().poll_next(cx)
    }
}

/// An in-flight upload: the progress stream plus the eventual outcome.
pub struct UploadTask {
    pub progress: UploadProgress,
    handle: tokio::task::JoinHandle<Result<serde_json::Value>>,
}

impl UploadTask {
    /// Wait for the upload to complete and classify its outcome.
    pub async fn finish(self) -> Result<serde_json::Value> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ApiError::Network(format!("upload task failed: {e}"))),
        }
    }
}

impl ApiClient {
    /// Upload a file through the pipeline. Shares the credential
    /// attachment and classification of every other call.
    pub fn upload(
        &self,
        path: &str,
        field: &str,
        file_name: &str,
        content: Bytes,
    ) -> UploadTask {
        let (tx, rx) = async_channel::unbounded();
        let request = ApiRequest {
            method: Method::POST,
            path: path.to_string(),
            query: Vec::new(),
            body: RequestBody::Multipart {
                field: field.to_string(),
                file_name: file_name.to_string(),
                content,
                progress: Some(tx),
            },
            bearer: None,
        };

        let client = self.clone();
        let handle = tokio::spawn(async move { client.request(request).await });

        UploadTask {
            progress: UploadProgress {
                receiver: Box::pin(rx),
            },
            handle,
        }
    }
}

/// Split `content` into chunks, reporting the cumulative fraction after
/// each chunk is yielded. An empty payload reports `1.0` immediately.
pub(crate) fn progress_chunks(
    content: Bytes,
    chunk_size: usize,
    progress: Option<async_channel::Sender<f32>>,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    if content.is_empty() {
        if let Some(tx) = &progress {
            let _ = tx.try_send(1.0);
        }
    }
    futures::stream::unfold(
        (content, 0usize, progress),
        move |(content, offset, progress)| async move {
            if offset >= content.len() {
                return None;
            }
            let end = (offset + chunk_size).min(content.len());
            let chunk = content.slice(offset..end);
            if let Some(tx) = &progress {
                let _ = tx.try_send(end as f32 / content.len() as f32);
            }
            Some((Ok(chunk), (content, end, progress)))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::traits::Transport;
    use crate::types::RawResponse;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::Arc;

    async fn drain<S: Stream<Item = std::io::Result<Bytes>> + Unpin>(mut s: S) -> Vec<Bytes> {
        let mut out = Vec::new();
        while let Some(chunk) = s.next().await {
            out.push(chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_one() {
        let (tx, rx) = async_channel::unbounded();
        let content = Bytes::from(vec![0u8; 10 * 1024]);
        let stream = progress_chunks(content, 3 * 1024, Some(tx));
        futures::pin_mut!(stream);
        let chunks = drain(stream).await;
        assert_eq!(chunks.len(), 4);

        let mut fractions = Vec::new();
        while let Ok(f) = rx.try_recv() {
            fractions.push(f);
        }
        assert_eq!(fractions.len(), 4);
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*fractions.last().unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_empty_payload_reports_complete() {
        let (tx, rx) = async_channel::unbounded();
        let stream = progress_chunks(Bytes::new(), 1024, Some(tx));
        futures::pin_mut!(stream);
        let chunks = drain(stream).await;
        assert!(chunks.is_empty());
        assert_eq!(rx.try_recv(), Ok(1.0));
    }

    #[tokio::test]
    async fn test_chunks_reassemble_to_payload() {
        let content = Bytes::from_static(b"question image bytes");
        let stream = progress_chunks(content.clone(), 7, None);
        futures::pin_mut!(stream);
        let chunks = drain(stream).await;
        let reassembled: Vec<u8> = chunks.iter().flat_map(|c| c.to_vec()).collect();
        assert_eq!(reassembled, content.to_vec());
    }

    /// Transport that drains the multipart body the way a real one would,
    /// driving the progress channel.
    struct DrainingTransport;

    #[async_trait]
    impl Transport for DrainingTransport {
        async fn send(&self, request: ApiRequest) -> crate::error::Result<RawResponse> {
            if let RequestBody::Multipart {
                content, progress, ..
            } = request.body
            {
                let stream = progress_chunks(content, 1024, progress);
                futures::pin_mut!(stream);
                while stream.next().await.is_some() {}
            }
            Ok(RawResponse::json(
                200,
                &serde_json::json!({"url": "/static/uploads/img.png"}),
            ))
        }
    }

    #[tokio::test]
    async fn test_progress_is_consumable_as_a_stream() {
        let client =
            ApiClient::with_transport(ClientConfig::default(), Arc::new(DrainingTransport));
        let task = client.upload(
            "/api/v1/problems/1/image",
            "file",
            "img.png",
            Bytes::from(vec![1u8; 2048]),
        );
        // Through the Stream impl, not the inherent next().
        let fractions: Vec<f32> = task.progress.collect().await;
        assert!(!fractions.is_empty());
        assert_eq!(fractions.last().copied(), Some(1.0));
    }

    #[tokio::test]
    async fn test_upload_task_reports_progress_then_finishes() {
        let client =
            ApiClient::with_transport(ClientConfig::default(), Arc::new(DrainingTransport));
        let mut task = client.upload(
            "/api/v1/problems/1/image",
            "file",
            "img.png",
            Bytes::from(vec![1u8; 4096]),
        );

        let mut last = 0.0;
        while let Some(f) = task.progress.next().await {
            assert!(f >= last);
            last = f;
        }
        assert_eq!(last, 1.0);

        let value = task.finish().await.unwrap();
        assert_eq!(value["url"], "/static/uploads/img.png");
    }
}
