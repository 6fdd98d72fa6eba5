//! Primary-then-fallback source composition.

use std::time::Duration;

use async_trait::async_trait;
use forestwatch_core::types::{LocationId, Timestamp};

use super::{ReadingSource, SourceError};

/// Asks `primary` first and, on any failure, `fallback`.
///
/// Only the fallback's error is reported when both fail. With a primary
/// timeout set, a primary that has not answered in time counts as failed.
pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
    primary_timeout: Option<Duration>,
}

impl<P, F> FallbackSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            primary_timeout: None,
        }
    }

    /// Give up on the primary after `timeout` and use the fallback.
    pub fn with_primary_timeout(mut self, timeout: Duration) -> Self {
        self.primary_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl<P, F> ReadingSource for FallbackSource<P, F>
where
    P: ReadingSource,
    F: ReadingSource,
{
    async fn fetch(&self, location_id: &LocationId, at: Timestamp) -> Result<f64, SourceError> {
        let primary = match self.primary_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.primary.fetch(location_id, at))
                .await
                .unwrap_or_else(|_| {
                    Err(SourceError::Timeout {
                        location_id: location_id.clone(),
                        timeout_ms: timeout.as_millis() as u64,
                    })
                }),
            None => self.primary.fetch(location_id, at).await,
        };

        match primary {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(
                    location_id = %location_id,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Primary source failed, using fallback",
                );
                self.fallback.fetch(location_id, at).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    struct Fixed(Result<f64, SourceError>);

    #[async_trait]
    impl ReadingSource for Fixed {
        async fn fetch(&self, _: &LocationId, _: Timestamp) -> Result<f64, SourceError> {
            self.0.clone()
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Never answers.
    struct Hung;

    #[async_trait]
    impl ReadingSource for Hung {
        async fn fetch(&self, _: &LocationId, _: Timestamp) -> Result<f64, SourceError> {
            std::future::pending().await
        }

        fn name(&self) -> &'static str {
            "hung"
        }
    }

    fn down() -> Fixed {
        Fixed(Err(SourceError::unavailable(&"a".into(), "down")))
    }

    #[tokio::test]
    async fn primary_value_wins() {
        let source = FallbackSource::new(Fixed(Ok(20.0)), Fixed(Ok(99.0)));
        assert_eq!(source.fetch(&"a".into(), Utc::now()).await, Ok(20.0));
    }

    #[tokio::test]
    async fn falls_back_on_primary_failure() {
        let source = FallbackSource::new(down(), Fixed(Ok(18.5)));
        assert_eq!(source.fetch(&"a".into(), Utc::now()).await, Ok(18.5));
    }

    #[tokio::test]
    async fn both_failing_reports_fallback_error() {
        let source = FallbackSource::new(down(), Fixed(Err(SourceError::UnknownLocation("a".into()))));
        assert_eq!(
            source.fetch(&"a".into(), Utc::now()).await,
            Err(SourceError::UnknownLocation("a".into()))
        );
    }

    /// A hung primary is abandoned after the primary timeout.
    #[tokio::test(start_paused = true)]
    async fn hung_primary_falls_back_after_timeout() {
        let source =
            FallbackSource::new(Hung, Fixed(Ok(18.5))).with_primary_timeout(Duration::from_secs(2));
        assert_eq!(source.fetch(&"a".into(), Utc::now()).await, Ok(18.5));
    }
}
