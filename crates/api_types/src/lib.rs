//! JSON-shaped records exchanged with the remote collaborators.
//!
//! Amounts on the wire are decimal dollars (the upstream services still emit
//! floats); conversion to integer cents happens at the boundary, never here.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Which way a balance points, as seen from the requesting user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceDirection {
    OwesYou,
    YouOwe,
}

impl BalanceDirection {
    /// Returns the canonical direction string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OwesYou => "owes_you",
            Self::YouOwe => "you_owe",
        }
    }
}

/// Minimal user reference embedded in expense and activity payloads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
}

pub mod expense {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ParticipantView {
        pub user: UserRef,
        /// Decimal dollars.
        pub amount: f64,
        #[serde(default)]
        pub is_payer: bool,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: String,
        #[serde(default)]
        pub note: String,
        /// Decimal dollars.
        pub total_amount: f64,
        #[serde(default)]
        pub group_name: Option<String>,
        pub created_at: Option<DateTime<FixedOffset>>,
        pub payer: UserRef,
        pub participants: Vec<ParticipantView>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub results: Vec<ExpenseView>,
    }

    /// One participant row in a create request.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ParticipantNew {
        pub user_id: String,
        /// Decimal dollars.
        pub amount: f64,
    }

    /// Request body for logging a new expense.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        /// Decimal dollars.
        pub total_amount: f64,
        #[serde(default)]
        pub note: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub group_name: Option<String>,
        pub participants: Vec<ParticipantNew>,
    }
}

pub mod activity {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ActivityView {
        pub id: String,
        pub summary: String,
        #[serde(default)]
        pub detail: String,
        #[serde(default)]
        pub status: String,
        /// Signed decimal dollars from the recipient's perspective.
        #[serde(default)]
        pub amount: f64,
        pub created_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ActivityFeedResponse {
        pub results: Vec<ActivityView>,
    }
}

pub mod friend {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct FriendView {
        pub id: String,
        pub name: String,
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub username: String,
        /// Signed decimal dollars; positive = this friend owes you.
        #[serde(default)]
        pub balance: f64,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct BalanceTotals {
        /// Decimal dollars you owe across friends.
        #[serde(default)]
        pub you_owe: f64,
        /// Decimal dollars owed to you across friends.
        #[serde(default)]
        pub owes_you: f64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct FriendsResponse {
        pub friends: Vec<FriendView>,
        #[serde(default)]
        pub totals: BalanceTotals,
    }

    /// Per-group entry in a friend breakdown. `amount` is an absolute
    /// magnitude; the sign lives in `direction`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct BreakdownGroup {
        pub slug: String,
        pub label: String,
        pub direction: BalanceDirection,
        /// Decimal dollars, absolute.
        pub amount: f64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct FriendBreakdown {
        pub groups: Vec<BreakdownGroup>,
        #[serde(default)]
        pub totals: BalanceTotals,
        /// Net signed balance in decimal dollars.
        #[serde(default)]
        pub balance: f64,
    }
}

pub mod invite {
    use super::*;

    /// Decision a recipient can take on a pending invite. The wire uses the
    /// action name as a path segment.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum InviteAction {
        Accept,
        Reject,
    }

    impl InviteAction {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Accept => "accept",
                Self::Reject => "reject",
            }
        }
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct InviteView {
        pub id: String,
        /// `pending`, `accepted` or `rejected`.
        pub status: String,
        #[serde(default)]
        pub note: String,
        pub created_at: Option<DateTime<FixedOffset>>,
        pub inviter: UserRef,
        pub invitee_email: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct InvitesResponse {
        #[serde(default)]
        pub count: usize,
        pub results: Vec<InviteView>,
    }

    /// Request body for inviting a friend by email.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct InviteNew {
        pub email: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub note: Option<String>,
    }

    /// Response to an invite decision. `friend` is present only when an
    /// acceptance created the friendship.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct InviteDecision {
        pub invite: InviteView,
        #[serde(default)]
        pub friend: Option<super::friend::FriendView>,
    }
}

pub mod notification {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: String,
        pub kind: String,
        pub title: String,
        #[serde(default)]
        pub body: String,
        #[serde(default)]
        pub is_read: bool,
        pub created_at: Option<DateTime<FixedOffset>>,
        #[serde(default)]
        pub actor: Option<UserRef>,
        /// Kind-specific payload, passed through untouched.
        #[serde(default)]
        pub data: serde_json::Value,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct NotificationsResponse {
        /// Unread count across the whole tray, not just this page.
        #[serde(default)]
        pub unread: usize,
        pub results: Vec<NotificationView>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct NotificationReadResponse {
        pub notification: NotificationView,
        #[serde(default)]
        pub unread: usize,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct NotificationReadAllResponse {
        #[serde(default)]
        pub unread: usize,
    }
}

pub mod settlement {
    use super::*;
    use super::friend::FriendBreakdown;

    /// Request body for settling one group, fully or partially.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct SettleGroupRequest {
        pub group_slug: String,
        /// Decimal dollars; must be positive and within the outstanding
        /// amount. Validated locally before the request goes out.
        pub amount: f64,
    }

    /// Audit record of one applied settlement.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        pub id: String,
        pub group: String,
        pub group_slug: String,
        pub direction: BalanceDirection,
        /// Decimal dollars.
        pub amount: f64,
        /// Whether the best-effort notification email went out. `false` is a
        /// warning for the user, not a failure of the settlement itself.
        #[serde(default)]
        pub email_delivered: bool,
        pub created_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct SettleGroupResponse {
        pub settlement: SettlementView,
        pub breakdown: FriendBreakdown,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct SettleAllSummary {
        pub groups_count: usize,
        /// Decimal dollars settled across all groups.
        pub total_amount: f64,
        #[serde(default)]
        pub email_delivered: bool,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct SettleAllResponse {
        pub summary: SettleAllSummary,
        #[serde(default)]
        pub settlements: Vec<SettlementView>,
        pub breakdown: FriendBreakdown,
    }
}

pub mod auth {
    use super::*;

    /// Error `code` the server attaches to a 401 when the access token is
    /// expired or malformed. The sole trigger for a refresh-and-retry.
    pub const TOKEN_NOT_VALID_CODE: &str = "token_not_valid";

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TokenPair {
        pub access: String,
        pub refresh: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RefreshRequest {
        pub refresh: String,
    }

    /// Refresh response; the server may rotate the refresh token.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RefreshResponse {
        pub access: String,
        #[serde(default)]
        pub refresh: Option<String>,
    }
}

pub mod realtime {
    use super::*;

    /// Envelope pushed on the realtime channel. The topic stays a plain
    /// string here; the client maps it onto its closed topic enum and drops
    /// anything it does not know.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RealtimeEvent {
        pub topic: String,
    }
}
