//! Stream accumulation for the narration stage.
//!
//! Collects an ordered, possibly delayed sequence of text fragments into
//! one completed payload. An empty completed payload is always a failure:
//! an empty generation is never valid output. Cancellation is dropping
//! the accumulation future; no partial result is surfaced.

use thiserror::Error;
use tokio_stream::{Stream, StreamExt};

use crate::agents::base::BackendError;

/// Why accumulation did not produce a payload.
#[derive(Error, Debug)]
pub enum AccumulateError {
    /// The source completed but the concatenated result was empty.
    #[error("stream completed with no content")]
    Empty,

    /// The fragment source itself failed mid-stream.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Concatenate fragments in arrival order until the source completes.
pub async fn accumulate<S>(fragments: S) -> Result<String, AccumulateError>
where
    S: Stream<Item = Result<String, BackendError>>,
{
    tokio::pin!(fragments);
    let mut payload = String::new();
    while let Some(fragment) = fragments.next().await {
        payload.push_str(&fragment?);
    }
    if payload.is_empty() {
        return Err(AccumulateError::Empty);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ok_fragments(parts: &[&str]) -> Vec<Result<String, BackendError>> {
        parts.iter().map(|p| Ok(p.to_string())).collect()
    }

    #[tokio::test]
    async fn test_accumulate_concatenates_in_order() {
        let stream = tokio_stream::iter(ok_fragments(&["ab", "", "cd"]));
        assert_eq!(accumulate(stream).await.unwrap(), "abcd");
    }

    #[tokio::test]
    async fn test_accumulate_empty_source_fails() {
        let stream = tokio_stream::iter(ok_fragments(&[]));
        assert!(matches!(
            accumulate(stream).await,
            Err(AccumulateError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_accumulate_whitespace_free_empty_fragments_fail() {
        let stream = tokio_stream::iter(ok_fragments(&[""]));
        assert!(matches!(
            accumulate(stream).await,
            Err(AccumulateError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_accumulate_propagates_source_error() {
        let stream = tokio_stream::iter(vec![
            Ok("partial".to_string()),
            Err(BackendError::Unavailable("cut off".to_string())),
        ]);
        assert!(matches!(
            accumulate(stream).await,
            Err(AccumulateError::Backend(BackendError::Unavailable(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_accumulate_waits_for_delayed_fragments() {
        let stream = async_stream::stream! {
            yield Ok("slow ".to_string());
            tokio::time::sleep(Duration::from_secs(5)).await;
            yield Ok("drip".to_string());
        };
        assert_eq!(accumulate(stream).await.unwrap(), "slow drip");
    }
}
