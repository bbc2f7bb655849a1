//! Transactions: a sender, a block position and one ledger call.

use {
    crate::{staking::ValidatorProfile, Result, StakeHub},
    serde::{Deserialize, Serialize},
    stakehub_common::types::{Address, BlockContext, ContractEvent},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Call {
    RegisterValidator {
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        social_links: String,
        commission_rate: u16,
    },
    UpdateValidator(ValidatorProfile),
    SetValidatorUptime {
        validator: Address,
        uptime: u16,
    },
    Stake {
        validator: Address,
        #[serde(with = "stakehub_common::utils::decimal_u128")]
        amount: u128,
    },
    SetAutoCompound {
        validator: Address,
        enabled: bool,
    },
    ClaimRewards {
        validator: Address,
    },
    CreateCommunityPool {
        name: String,
        #[serde(default)]
        validator: Option<Address>,
    },
    ContributeToPool {
        pool_id: u64,
        #[serde(with = "stakehub_common::utils::decimal_u128")]
        amount: u128,
    },
    CloseCommunityPool {
        pool_id: u64,
    },
    RecordReferral {
        referrer: Address,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::RegisterValidator { .. } => "registerValidator",
            Call::UpdateValidator(_) => "updateValidator",
            Call::SetValidatorUptime { .. } => "setValidatorUptime",
            Call::Stake { .. } => "stake",
            Call::SetAutoCompound { .. } => "setAutoCompound",
            Call::ClaimRewards { .. } => "claimRewards",
            Call::CreateCommunityPool { .. } => "createCommunityPool",
            Call::ContributeToPool { .. } => "contributeToPool",
            Call::CloseCommunityPool { .. } => "closeCommunityPool",
            Call::RecordReferral { .. } => "recordReferral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub block: u64,
    pub timestamp: i64,
    pub sender: Address,
    pub call: Call,
}

impl Transaction {
    pub fn context(&self) -> BlockContext {
        BlockContext::new(self.block, self.timestamp)
    }
}

impl StakeHub {
    /// Applies one transaction and returns the events it emitted.
    pub fn execute(&mut self, tx: &Transaction) -> Result<Vec<ContractEvent>> {
        let ctx = tx.context();
        let sender = tx.sender;
        // events from earlier direct calls stay queued
        let start = self.pending_event_count();

        let outcome = match &tx.call {
            Call::RegisterValidator { name, description, social_links, commission_rate } => {
                self.register_validator(ctx, sender, name, description, social_links, *commission_rate)
            }
            Call::UpdateValidator(profile) => self.update_validator(ctx, sender, profile.clone()),
            Call::SetValidatorUptime { validator, uptime } => {
                self.set_validator_uptime(ctx, sender, *validator, *uptime)
            }
            Call::Stake { validator, amount } => self.stake(ctx, sender, *validator, *amount),
            Call::SetAutoCompound { validator, enabled } => {
                self.set_auto_compound(ctx, sender, *validator, *enabled)
            }
            Call::ClaimRewards { validator } => self.claim_rewards(ctx, sender, *validator).map(|_| ()),
            Call::CreateCommunityPool { name, validator } => {
                self.create_community_pool(ctx, sender, name, *validator).map(|_| ())
            }
            Call::ContributeToPool { pool_id, amount } => {
                self.contribute_to_pool(ctx, sender, *pool_id, *amount)
            }
            Call::CloseCommunityPool { pool_id } => self.close_community_pool(ctx, sender, *pool_id),
            Call::RecordReferral { referrer } => self.record_referral(ctx, sender, *referrer),
        };

        let emitted = self.split_events_from(start);
        outcome.map(|_| emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakehub_common::types::EventKind;
    use stakehub_common::StakingConfig;

    #[test]
    fn parses_script_entries() {
        let json = r#"[
            {"block": 1, "timestamp": 100, "sender": "0x0000000000000000000000000000000000000001",
             "call": {"type": "register_validator", "name": "Monad Validators", "commission_rate": 500}},
            {"block": 2, "timestamp": 110, "sender": "0x0000000000000000000000000000000000000003",
             "call": {"type": "stake", "validator": "0x0000000000000000000000000000000000000001",
                      "amount": "1000000000000000000"}},
            {"block": 3, "timestamp": 120, "sender": "0x0000000000000000000000000000000000000001",
             "call": {"type": "update_validator", "name": "MV", "commission_rate": 700}}
        ]"#;
        let txs: Vec<Transaction> = serde_json::from_str(json).unwrap();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[1].call.name(), "stake");
        match &txs[2].call {
            Call::UpdateValidator(profile) => {
                assert!(profile.is_active);
                assert_eq!(profile.commission_rate, 700);
            }
            other => panic!("unexpected call {other:?}"),
        }

        let mut hub = StakeHub::new(StakingConfig::default(), Address::ZERO);
        let events = hub.execute(&txs[0]).unwrap();
        assert!(matches!(events[0].kind, EventKind::ValidatorRegistered { .. }));
        let events = hub.execute(&txs[1]).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(hub.get_total_staked(), 1_000_000_000_000_000_000);
    }

    #[test]
    fn failed_call_emits_nothing() {
        let mut hub = StakeHub::new(StakingConfig::default(), Address::ZERO);
        let tx = Transaction {
            block: 1,
            timestamp: 100,
            sender: Address::new([3; 20]),
            call: Call::ClaimRewards { validator: Address::new([1; 20]) },
        };
        assert!(hub.execute(&tx).is_err());
        assert!(hub.drain_events().is_empty());
    }
}
