//! Notification channel boundary
//!
//! The core produces a [`Notification`] and decides whether one is due;
//! delivering it is up to a [`Notifier`] implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::report::Report;
use crate::threshold::ThresholdEvaluation;
use crate::Result;

/// A message ready for publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}

impl From<&Report> for Notification {
    fn from(report: &Report) -> Self {
        Self {
            subject: report.subject.clone(),
            message: report.render(),
        }
    }
}

/// Only an exceeded threshold warrants an alert
pub fn should_notify(evaluation: &ThresholdEvaluation) -> bool {
    evaluation.exceeded
}

/// Publishes notifications to an external channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<()>;
}

/// Notifier that writes notifications to the tracing log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    topic: Option<String>,
}

impl LogNotifier {
    pub fn with_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        info!(
            topic = self.topic.as_deref().unwrap_or("default"),
            subject = %notification.subject,
            "Publishing notification\n{}",
            notification.message
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::evaluate_threshold;

    fn report() -> Report {
        Report {
            title: "Title".to_string(),
            subject: "Cost Alert: $6.00".to_string(),
            sections: vec![],
        }
    }

    #[test]
    fn test_notification_from_report() {
        let notification = Notification::from(&report());
        assert_eq!(notification.subject, "Cost Alert: $6.00");
        assert_eq!(notification.message, "Title\n");
    }

    #[test]
    fn test_should_notify() {
        assert!(should_notify(&evaluate_threshold(6.0, 5.0)));
        assert!(!should_notify(&evaluate_threshold(4.0, 5.0)));
    }

    #[tokio::test]
    async fn test_log_notifier_publishes() {
        let notifier = LogNotifier::with_topic("cost-alerts");
        notifier
            .publish(&Notification::from(&report()))
            .await
            .unwrap();
    }
}
