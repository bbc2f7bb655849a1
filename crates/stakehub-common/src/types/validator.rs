use {
    super::Address,
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: Address,
    pub name: String,
    pub description: String,
    /// Free-form JSON blob with links (twitter, website, ...).
    pub social_links: String,
    /// Commission on rewards, in basis points.
    pub commission_rate: u16,
    #[serde(with = "crate::utils::decimal_u128")]
    pub total_staked: u128,
    /// Uptime in basis points (9995 = 99.95%).
    pub uptime: u16,
    pub user_count: u32,
    pub is_active: bool,
    pub registered_at: i64,
    /// Commission retained from stakers' rewards so far.
    #[serde(with = "crate::utils::decimal_u128")]
    pub commission_earned: u128,
}

/// Tuple-shaped view returned by index lookups over the validator list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSummary {
    pub address: Address,
    pub name: String,
    pub description: String,
    pub commission_rate: u16,
    #[serde(with = "crate::utils::decimal_u128")]
    pub total_staked: u128,
    pub user_count: u32,
    pub uptime: u16,
}

impl From<&Validator> for ValidatorSummary {
    fn from(v: &Validator) -> Self {
        Self {
            address: v.address,
            name: v.name.clone(),
            description: v.description.clone(),
            commission_rate: v.commission_rate,
            total_staked: v.total_staked,
            user_count: v.user_count,
            uptime: v.uptime,
        }
    }
}
