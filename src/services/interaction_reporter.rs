use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::Interaction;
use crate::sources::ContentSource;

/// Fire-and-forget interaction reporting. One attempt, no retry, no queue;
/// failures are logged and dropped so browsing never waits on analytics.
pub struct InteractionReporter<S: ContentSource> {
    source: Arc<S>,
}

impl<S: ContentSource> InteractionReporter<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Returns whether the event was delivered, for callers that care
    pub async fn report(&self, interaction: Interaction) -> bool {
        match self.source.record_interaction(&interaction).await {
            Ok(()) => {
                debug!(
                    content_id = %interaction.content_id,
                    kind = %interaction.kind,
                    value = interaction.value,
                    "Tracked interaction"
                );
                true
            }
            Err(e) => {
                warn!(
                    content_id = %interaction.content_id,
                    kind = %interaction.kind,
                    error = %e,
                    "Error tracking interaction"
                );
                false
            }
        }
    }
}

impl<S: ContentSource> Clone for InteractionReporter<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InteractionKind;
    use crate::errors::FeedError;
    use crate::sources::traits::MockContentSource;

    #[tokio::test]
    async fn test_report_success() {
        let mut source = MockContentSource::new();
        source
            .expect_record_interaction()
            .withf(|i| i.content_id == "c1" && i.kind == InteractionKind::Like && i.value == 1)
            .times(1)
            .returning(|_| Ok(()));

        let reporter = InteractionReporter::new(Arc::new(source));
        assert!(reporter.report(Interaction::new("c1", InteractionKind::Like)).await);
    }

    #[tokio::test]
    async fn test_report_failure_is_swallowed() {
        let mut source = MockContentSource::new();
        source
            .expect_record_interaction()
            .times(1)
            .returning(|_| Err(FeedError::Storage("offline".to_string())));

        let reporter = InteractionReporter::new(Arc::new(source));
        assert!(!reporter.report(Interaction::new("c1", InteractionKind::View)).await);
    }
}
