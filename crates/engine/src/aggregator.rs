//! Outcome aggregator: reduces per-channel outcomes to one record status.
//!
//! Policy: any successful channel marks the notification `sent`. The status
//! reports reachability, not completeness; per-channel detail lives in the
//! dispatch report and the stored delivery rows.

use chrono::{DateTime, Utc};

use deadsync_common::types::{ChannelOutcome, DeliveryStatus};

/// Terminal state computed for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub status: DeliveryStatus,
    /// Set if and only if `status` is `Sent`.
    pub sent_at: Option<DateTime<Utc>>,
}

pub struct OutcomeAggregator;

impl OutcomeAggregator {
    pub fn aggregate(outcomes: &[ChannelOutcome], completed_at: DateTime<Utc>) -> AggregateOutcome {
        if outcomes.iter().any(|o| o.success) {
            AggregateOutcome {
                status: DeliveryStatus::Sent,
                sent_at: Some(completed_at),
            }
        } else {
            AggregateOutcome {
                status: DeliveryStatus::Failed,
                sent_at: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadsync_common::types::ChannelKind;

    #[test]
    fn test_all_success_is_sent() {
        let now = Utc::now();
        let agg = OutcomeAggregator::aggregate(
            &[
                ChannelOutcome::delivered(ChannelKind::Email),
                ChannelOutcome::delivered(ChannelKind::Chat),
            ],
            now,
        );
        assert_eq!(agg.status, DeliveryStatus::Sent);
        assert_eq!(agg.sent_at, Some(now));
    }

    #[test]
    fn test_all_failed_is_failed() {
        let agg = OutcomeAggregator::aggregate(
            &[
                ChannelOutcome::failed(ChannelKind::Email, "smtp down"),
                ChannelOutcome::failed(ChannelKind::Push, "no device token"),
            ],
            Utc::now(),
        );
        assert_eq!(agg.status, DeliveryStatus::Failed);
        assert_eq!(agg.sent_at, None);
    }

    // Product policy: one reachable channel is enough for `sent`.
    #[test]
    fn test_single_success_dominates() {
        let agg = OutcomeAggregator::aggregate(
            &[
                ChannelOutcome::failed(ChannelKind::Email, "bounced"),
                ChannelOutcome::delivered(ChannelKind::Chat),
                ChannelOutcome::failed(ChannelKind::Calendar, "no deadline"),
            ],
            Utc::now(),
        );
        assert_eq!(agg.status, DeliveryStatus::Sent);
        assert!(agg.sent_at.is_some());
    }

    #[test]
    fn test_not_implemented_is_not_success() {
        let agg = OutcomeAggregator::aggregate(
            &[ChannelOutcome::not_implemented(ChannelKind::Push, "no adapter")],
            Utc::now(),
        );
        assert_eq!(agg.status, DeliveryStatus::Failed);
    }

    #[test]
    fn test_no_outcomes_is_failed() {
        let agg = OutcomeAggregator::aggregate(&[], Utc::now());
        assert_eq!(agg.status, DeliveryStatus::Failed);
        assert_eq!(agg.sent_at, None);
    }
}
