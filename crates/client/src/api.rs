//! HTTP access to the expense services.
//!
//! Every authorized call validates locally first, attaches the session's
//! access token, and retries exactly once after a coalesced refresh when
//! the server answers 401 with the token-not-valid code. Any other
//! rejection surfaces the deepest message its body yields.

use api_types::activity::{ActivityFeedResponse, ActivityView};
use api_types::auth::{RefreshRequest, RefreshResponse, TOKEN_NOT_VALID_CODE};
use api_types::expense::{ExpenseListResponse, ExpenseNew, ExpenseView};
use api_types::friend::{BreakdownGroup, FriendBreakdown, FriendsResponse};
use api_types::invite::{InviteAction, InviteDecision, InviteNew, InviteView, InvitesResponse};
use api_types::notification::{
    NotificationReadAllResponse, NotificationReadResponse, NotificationsResponse,
};
use api_types::settlement::{SettleAllResponse, SettleGroupRequest, SettleGroupResponse};
use async_trait::async_trait;
use ledger::Money;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::convert;
use crate::error::{ClientError, REQUEST_FAILED, Result, resolve_error_message};
use crate::events::{EventBus, Topic};
use crate::session::{AuthApi, Session};

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|err| ClientError::Rejected(format!("invalid url: {err}")))
}

/// Client for the unauthenticated refresh endpoint. Separate from
/// [`ApiClient`] so the session can own it without a cycle.
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpAuthApi {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let endpoint = join(&self.base_url, "api/users/token/refresh/")?;
        let response = self
            .http
            .post(endpoint)
            .json(&RefreshRequest {
                refresh: refresh_token.to_string(),
            })
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(response.json::<RefreshResponse>().await?);
        }
        let payload = response.json::<Value>().await.unwrap_or(Value::Null);
        Err(ClientError::Rejected(
            resolve_error_message(&payload).unwrap_or_else(|| REQUEST_FAILED.to_string()),
        ))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    session: Session,
    bus: EventBus,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: Url, session: Session, bus: EventBus) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
            session,
            bus,
        }
    }

    pub async fn list_expenses(&self) -> Result<Vec<ExpenseView>> {
        let response: ExpenseListResponse = self.get("api/expenses/").await?;
        Ok(response.results)
    }

    /// Records a new expense. The share sum is checked against the total
    /// before anything goes over the wire.
    pub async fn create_expense(&self, request: &ExpenseNew) -> Result<ExpenseView> {
        let total = Money::from_dollars(request.total_amount);
        let shares = request
            .participants
            .iter()
            .map(|p| Money::from_dollars(p.amount));
        ledger::validate_shares(total, shares)?;

        let view: ExpenseView = self
            .send(Method::POST, "api/expenses/", Some(serde_json::to_value(request)?))
            .await?;
        self.bus.publish(Topic::Activity);
        self.bus.publish(Topic::Friends);
        Ok(view)
    }

    pub async fn activity_feed(&self) -> Result<Vec<ActivityView>> {
        let response: ActivityFeedResponse = self.get("api/activity/").await?;
        Ok(response.results)
    }

    pub async fn friends(&self) -> Result<FriendsResponse> {
        self.get("api/users/friends/").await
    }

    pub async fn friend_breakdown(&self, friend_id: &str) -> Result<FriendBreakdown> {
        self.get(&format!("api/users/friends/{friend_id}/ledger/"))
            .await
    }

    /// Pending invites addressed to the viewer.
    pub async fn invites(&self) -> Result<Vec<InviteView>> {
        let response: InvitesResponse = self.get("api/users/friends/invites/").await?;
        Ok(response.results)
    }

    pub async fn send_invite(&self, request: &InviteNew) -> Result<InviteView> {
        let invite: InviteView = self
            .send(
                Method::POST,
                "api/users/friends/invite/",
                Some(serde_json::to_value(request)?),
            )
            .await?;
        self.bus.publish(Topic::Invites);
        Ok(invite)
    }

    /// Accepts or rejects a pending invite. Acceptance also creates the
    /// friendship, so the friends view refreshes alongside the tray.
    pub async fn respond_to_invite(
        &self,
        invite_id: &str,
        action: InviteAction,
    ) -> Result<InviteDecision> {
        let decision: InviteDecision = self
            .send(
                Method::POST,
                &format!("api/users/friends/invites/{invite_id}/{}/", action.as_str()),
                None,
            )
            .await?;
        self.bus.publish(Topic::Invites);
        self.bus.publish(Topic::Friends);
        Ok(decision)
    }

    /// Most recent notifications, newest first. The server clamps `limit`
    /// to its own bounds.
    pub async fn notifications(
        &self,
        limit: usize,
        unread_only: bool,
    ) -> Result<NotificationsResponse> {
        let mut path = format!("api/users/notifications/?limit={limit}");
        if unread_only {
            path.push_str("&unread_only=1");
        }
        self.get(&path).await
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: &str,
    ) -> Result<NotificationReadResponse> {
        let response: NotificationReadResponse = self
            .send(
                Method::POST,
                &format!("api/users/notifications/{notification_id}/read/"),
                None,
            )
            .await?;
        self.bus.publish(Topic::Notifications);
        Ok(response)
    }

    pub async fn mark_all_notifications_read(&self) -> Result<NotificationReadAllResponse> {
        let response: NotificationReadAllResponse = self
            .send(Method::POST, "api/users/notifications/read-all/", None)
            .await?;
        self.bus.publish(Topic::Notifications);
        Ok(response)
    }

    /// Settles part or all of one group with a friend. The request is
    /// validated against the outstanding amount before the network call, so
    /// an over-settlement never leaves the process.
    pub async fn settle_group(
        &self,
        friend_id: &str,
        group: &BreakdownGroup,
        amount: Money,
    ) -> Result<SettleGroupResponse> {
        let outstanding = convert::group_balance(group).amount.abs();
        ledger::settle_group(outstanding, amount)?;

        let request = SettleGroupRequest {
            group_slug: group.slug.clone(),
            amount: amount.to_dollars(),
        };
        let response: SettleGroupResponse = self
            .send(
                Method::POST,
                &format!("api/users/friends/{friend_id}/settlements/"),
                Some(serde_json::to_value(&request)?),
            )
            .await?;
        if !response.settlement.email_delivered {
            tracing::warn!(friend_id, group = %group.slug, "settlement saved, notification email not delivered");
        }
        self.publish_settlement_signals();
        Ok(response)
    }

    /// Settles every outstanding group with a friend in one logical
    /// transaction. Fails locally when nothing is outstanding.
    pub async fn settle_all(
        &self,
        friend_id: &str,
        breakdown: &FriendBreakdown,
    ) -> Result<SettleAllResponse> {
        let groups: Vec<_> = breakdown.groups.iter().map(convert::group_balance).collect();
        let plan = ledger::settle_all(&groups)?;
        tracing::debug!(
            friend_id,
            groups = plan.count,
            total_cents = plan.total.cents(),
            "settling all outstanding groups"
        );

        let response: SettleAllResponse = self
            .send(
                Method::POST,
                &format!("api/users/friends/{friend_id}/settlements/all/"),
                Some(Value::Object(serde_json::Map::new())),
            )
            .await?;
        if !response.summary.email_delivered {
            tracing::warn!(friend_id, "settlements saved, notification email not delivered");
        }
        self.publish_settlement_signals();
        Ok(response)
    }

    fn publish_settlement_signals(&self) {
        self.bus.publish(Topic::Friends);
        self.bus.publish(Topic::Activity);
        self.bus.publish(Topic::Notifications);
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None).await
    }

    /// One authorized request with at most one refresh-and-retry.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let endpoint = join(&self.base_url, path)?;
        let mut token = self.session.access_token().await;

        for attempt in 0..2 {
            let mut request = self
                .http
                .request(method.clone(), endpoint.clone())
                .bearer_auth(&token);
            if let Some(body) = &body {
                request = request.json(body);
            }
            let response = request.send().await?;
            if response.status().is_success() {
                return Ok(response.json::<T>().await?);
            }

            let status = response.status();
            let payload = response.json::<Value>().await.unwrap_or(Value::Null);
            let token_invalid = status == StatusCode::UNAUTHORIZED
                && payload.get("code").and_then(Value::as_str) == Some(TOKEN_NOT_VALID_CODE);

            if token_invalid {
                if attempt == 0 {
                    token = self.session.refresh_access_token().await?;
                    continue;
                }
                return Err(ClientError::SessionExpired);
            }
            return Err(ClientError::Rejected(
                resolve_error_message(&payload).unwrap_or_else(|| REQUEST_FAILED.to_string()),
            ));
        }
        Err(ClientError::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::BalanceDirection;
    use api_types::auth::TokenPair;
    use api_types::expense::ParticipantNew;
    use ledger::LedgerError;
    use std::sync::Arc;

    struct UnreachableAuth;

    #[async_trait]
    impl AuthApi for UnreachableAuth {
        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshResponse> {
            panic!("refresh must not be reached from local validation paths");
        }
    }

    fn offline_client() -> ApiClient {
        let session = Session::new(
            Arc::new(UnreachableAuth),
            Arc::new(crate::session::MemoryTokenStore::default()),
            TokenPair {
                access: "access".into(),
                refresh: "refresh".into(),
            },
        );
        ApiClient::new(
            Url::parse("http://localhost:9/").unwrap(),
            session,
            EventBus::default(),
        )
    }

    fn trip_group(amount: f64) -> BreakdownGroup {
        BreakdownGroup {
            slug: "trip".into(),
            label: "Trip".into(),
            direction: BalanceDirection::OwesYou,
            amount,
        }
    }

    #[tokio::test]
    async fn over_settlement_is_rejected_before_any_request() {
        let client = offline_client();
        let err = client
            .settle_group("friend-1", &trip_group(50.0), Money::new(5001))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(LedgerError::SettlementExceedsOutstanding { .. })
        ));
    }

    #[tokio::test]
    async fn mismatched_shares_are_rejected_before_any_request() {
        let client = offline_client();
        let request = ExpenseNew {
            total_amount: 100.0,
            note: "Dinner".into(),
            group_name: None,
            participants: vec![
                ParticipantNew {
                    user_id: "u1".into(),
                    amount: 30.0,
                },
                ParticipantNew {
                    user_id: "u2".into(),
                    amount: 30.0,
                },
            ],
        };
        let err = client.create_expense(&request).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(LedgerError::ShareSumMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn settle_all_with_cleared_breakdown_fails_locally() {
        let client = offline_client();
        let breakdown = FriendBreakdown {
            groups: vec![trip_group(0.0)],
            totals: Default::default(),
            balance: 0.0,
        };
        let err = client.settle_all("friend-1", &breakdown).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(LedgerError::NoOutstandingGroups)
        ));
    }
}
