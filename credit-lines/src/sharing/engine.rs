//! Diff engine
//!
//! Decides, for one sharing configuration and the old/new snapshots of the
//! record it covers, whether a share, a revoke or nothing goes out.
//!
//! A record is disclosed when its configuration exists, the configuration's
//! appetite flag is shared and the record exists. Leaving that state sends a
//! revoke to the previous recipient. Being in it sends a share when the
//! projected payload changed or a pending disclosure request exists.

use crate::{
    messages::OutboundMessage, metrics::SHARE_DECISIONS_TOTAL, models::FeatureType,
    request_client::RequestClient, Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Lookup of outstanding disclosure requests
#[async_trait]
pub trait PendingRequestCorrelator: Send + Sync {
    /// What identifies the request a share answers
    type Key: Send + Sync;
    type Request: Send;

    /// Pending request for `key`, if any
    async fn get_pending_request(&self, key: &Self::Key) -> Result<Option<Self::Request>>;

    /// Close a request answered by a share
    async fn mark_completed(&self, request: Self::Request) -> Result<()>;
}

/// Sender-side envelope fields
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeHeader<'a> {
    pub owner_static_id: &'a str,
    pub feature_type: FeatureType,
}

/// What differs between the credit-line and deposit/loan flows
pub struct ShareFlavor<S, R, D, K> {
    /// Label for logs and metrics
    pub name: &'static str,
    pub recipient: fn(&S) -> &str,
    pub appetite_shared: fn(&S) -> bool,
    pub feature_type: fn(&R) -> FeatureType,
    pub build_payload: fn(&S, &R) -> D,
    pub build_message: fn(&EnvelopeHeader<'_>, &S, &R, D) -> OutboundMessage,
    pub build_revoke_message: fn(&EnvelopeHeader<'_>, &S, &R) -> OutboundMessage,
    pub request_key: fn(&S, &R) -> K,
}

/// Result of comparing two snapshots, before any I/O
#[derive(Debug, PartialEq)]
pub enum Diff<'a, S, R, D> {
    /// Not disclosed before or after
    Hidden,
    /// Disclosed before, not after
    Revoke { shared: &'a S, record: &'a R },
    /// Disclosed after
    Share {
        shared: &'a S,
        record: &'a R,
        payload: D,
        changed: bool,
    },
}

/// Outcome of [`ShareDataService::process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareDecision {
    NoOp,
    /// `forced` when only a pending request caused the share
    Shared { forced: bool },
    Revoked,
}

impl ShareDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareDecision::NoOp => "noop",
            ShareDecision::Shared { forced: false } => "share",
            ShareDecision::Shared { forced: true } => "forced_share",
            ShareDecision::Revoked => "revoke",
        }
    }
}

fn disclosed<'a, S, R, D, K>(
    flavor: &ShareFlavor<S, R, D, K>,
    shared: Option<&'a S>,
    record: Option<&'a R>,
) -> Option<(&'a S, &'a R)> {
    match (shared, record) {
        (Some(shared), Some(record)) if (flavor.appetite_shared)(shared) => Some((shared, record)),
        _ => None,
    }
}

/// Compare old and new snapshots of one sharing configuration
pub fn diff<'a, S, R, D, K>(
    flavor: &ShareFlavor<S, R, D, K>,
    new_shared: Option<&'a S>,
    old_shared: Option<&'a S>,
    new_record: Option<&'a R>,
    old_record: Option<&'a R>,
) -> Diff<'a, S, R, D>
where
    D: PartialEq,
{
    let previous = disclosed(flavor, old_shared, old_record);
    let current = disclosed(flavor, new_shared, new_record);

    match (previous, current) {
        (Some((shared, record)), None) => Diff::Revoke { shared, record },
        (None, None) => Diff::Hidden,
        (previous, Some((shared, record))) => {
            let payload = (flavor.build_payload)(shared, record);
            let changed = match previous {
                Some((old_shared, old_record)) => (flavor.build_payload)(old_shared, old_record) != payload,
                None => true,
            };
            Diff::Share {
                shared,
                record,
                payload,
                changed,
            }
        }
    }
}

/// Diff engine bound to its collaborators
pub struct ShareDataService<S, R, D, C: PendingRequestCorrelator> {
    flavor: ShareFlavor<S, R, D, C::Key>,
    owner_static_id: String,
    request_client: Arc<RequestClient>,
    correlator: Arc<C>,
}

impl<S, R, D, C> ShareDataService<S, R, D, C>
where
    S: Sync,
    R: Sync,
    D: PartialEq + Send,
    C: PendingRequestCorrelator,
{
    pub fn new(
        flavor: ShareFlavor<S, R, D, C::Key>,
        owner_static_id: impl Into<String>,
        request_client: Arc<RequestClient>,
        correlator: Arc<C>,
    ) -> Self {
        Self {
            flavor,
            owner_static_id: owner_static_id.into(),
            request_client,
            correlator,
        }
    }

    fn header(&self, record: &R) -> EnvelopeHeader<'_> {
        EnvelopeHeader {
            owner_static_id: &self.owner_static_id,
            feature_type: (self.flavor.feature_type)(record),
        }
    }

    /// Send whatever the transition from the old to the new snapshot calls
    /// for. Callers must pass snapshots in mutation order.
    pub async fn process(
        &self,
        new_shared: Option<&S>,
        old_shared: Option<&S>,
        new_record: Option<&R>,
        old_record: Option<&R>,
    ) -> Result<ShareDecision> {
        let decision = match diff(&self.flavor, new_shared, old_shared, new_record, old_record) {
            Diff::Hidden => ShareDecision::NoOp,
            Diff::Revoke { shared, record } => {
                let message = (self.flavor.build_revoke_message)(&self.header(record), shared, record);
                info!(
                    flavor = self.flavor.name,
                    recipient = %message.recipient_static_id,
                    "Revoking shared data"
                );
                self.request_client.send(&message).await?;
                ShareDecision::Revoked
            }
            Diff::Share {
                shared,
                record,
                payload,
                changed,
            } => {
                let key = (self.flavor.request_key)(shared, record);
                let pending = self.correlator.get_pending_request(&key).await?;

                if !changed && pending.is_none() {
                    debug!(
                        flavor = self.flavor.name,
                        recipient = (self.flavor.recipient)(shared),
                        "Shared data unchanged"
                    );
                    ShareDecision::NoOp
                } else {
                    let forced = !changed;
                    let message = (self.flavor.build_message)(&self.header(record), shared, record, payload);
                    info!(
                        flavor = self.flavor.name,
                        recipient = %message.recipient_static_id,
                        forced,
                        "Sharing data"
                    );
                    self.request_client.send(&message).await?;

                    if let Some(request) = pending {
                        self.correlator.mark_completed(request).await?;
                    }
                    ShareDecision::Shared { forced }
                }
            }
        };

        SHARE_DECISIONS_TOTAL
            .with_label_values(&[self.flavor.name, decision.as_str()])
            .inc();

        Ok(decision)
    }

    /// Process every configuration of one record. Configurations are paired
    /// by recipient; one present only in `old_configs` was removed.
    pub async fn process_all(
        &self,
        new_configs: &[S],
        old_configs: &[S],
        new_record: Option<&R>,
        old_record: Option<&R>,
    ) -> Result<Vec<ShareDecision>> {
        let recipient = self.flavor.recipient;
        let mut decisions = Vec::with_capacity(new_configs.len() + old_configs.len());

        for new_shared in new_configs {
            let old_shared = old_configs
                .iter()
                .find(|old| recipient(old) == recipient(new_shared));
            decisions.push(
                self.process(Some(new_shared), old_shared, new_record, old_record)
                    .await?,
            );
        }

        let removed = old_configs
            .iter()
            .filter(|old| !new_configs.iter().any(|new| recipient(new) == recipient(old)));
        for old_shared in removed {
            decisions.push(self.process(None, Some(old_shared), new_record, old_record).await?);
        }

        Ok(decisions)
    }
}
