use {
    super::Address,
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityPool {
    pub id: u64,
    pub name: String,
    pub creator: Address,
    #[serde(with = "crate::utils::decimal_u128")]
    pub total_amount: u128,
    pub member_count: u32,
    pub validator: Option<Address>,
    pub active: bool,
    pub created_at: i64,
}
