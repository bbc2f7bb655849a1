use {
    super::Address,
    serde::{Deserialize, Serialize},
};

/// Static badge catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    FirstStake,
    LoyalStaker,
    BulkStaker,
    CommunityMember,
    ReferralLeader,
}

impl BadgeKind {
    pub const ALL: [BadgeKind; 5] = [
        BadgeKind::FirstStake,
        BadgeKind::LoyalStaker,
        BadgeKind::BulkStaker,
        BadgeKind::CommunityMember,
        BadgeKind::ReferralLeader,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BadgeKind::FirstStake => "First Stake",
            BadgeKind::LoyalStaker => "Loyal Staker",
            BadgeKind::BulkStaker => "Bulk Staker",
            BadgeKind::CommunityMember => "Community Member",
            BadgeKind::ReferralLeader => "Referral Leader",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BadgeKind::FirstStake => "Made a first stake",
            BadgeKind::LoyalStaker => "Kept a stake for at least 30 days",
            BadgeKind::BulkStaker => "Staked 1000 tokens in total",
            BadgeKind::CommunityMember => "Contributed to a community pool",
            BadgeKind::ReferralLeader => "Referred at least 5 users",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            BadgeKind::FirstStake | BadgeKind::CommunityMember => 1,
            BadgeKind::LoyalStaker | BadgeKind::ReferralLeader => 2,
            BadgeKind::BulkStaker => 3,
        }
    }

    /// Catalog lookup by name and level, as emitted in badge events.
    pub fn from_name_level(name: &str, level: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name && kind.level() == level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user: Address,
    pub badge: BadgeKind,
    pub earned_at: i64,
}
