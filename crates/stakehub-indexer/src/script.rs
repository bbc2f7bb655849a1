//! Transaction scripts: a JSON array of [`Transaction`]s executed in order
//! against an in-process ledger.

use {
    anyhow::{anyhow, Context, Result},
    stakehub_common::{
        types::ContractEvent,
        utils::{duration_since, format_timestamp},
    },
    stakehub_staking::{StakeHub, Transaction},
    std::{fs, path::Path, sync::Arc, time::Duration},
    tokio::sync::{mpsc, RwLock},
    tracing::{debug, info, warn},
};

pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transaction script {}", path.display()))?;
    let transactions: Vec<Transaction> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse transaction script {}", path.display()))?;
    debug!("Loaded {} transactions from {}", transactions.len(), path.display());
    Ok(transactions)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScriptReport {
    pub applied: usize,
    pub rejected: usize,
    pub events: usize,
    /// Block time between the first and last transaction.
    pub chain_time: Duration,
}

/// Executes `transactions` one by one and forwards the emitted events.
/// A rejected transaction is logged and skipped.
pub async fn execute_script(
    hub: Arc<RwLock<StakeHub>>,
    transactions: Vec<Transaction>,
    events: mpsc::Sender<ContractEvent>,
) -> Result<ScriptReport> {
    let mut report = ScriptReport::default();
    if let (Some(first), Some(last)) = (transactions.first(), transactions.last()) {
        report.chain_time = duration_since(first.timestamp, last.timestamp);
    }

    for (i, tx) in transactions.iter().enumerate() {
        // the write guard is released before the events are sent so the
        // indexer can read the ledger while this task waits on the channel
        let outcome = hub.write().await.execute(tx);
        match outcome {
            Ok(emitted) => {
                report.applied += 1;
                report.events += emitted.len();
                debug!(
                    "Transaction {} ({}) from {} emitted {} events",
                    i,
                    tx.call.name(),
                    tx.sender,
                    emitted.len()
                );
                for event in emitted {
                    events
                        .send(event)
                        .await
                        .map_err(|_| anyhow!("Event channel closed"))?;
                }
            }
            Err(e) => {
                report.rejected += 1;
                warn!(
                    "Transaction {} ({}) from {} at block {} ({}) rejected: {}",
                    i,
                    tx.call.name(),
                    tx.sender,
                    tx.block,
                    format_timestamp(tx.timestamp),
                    e
                );
            }
        }
    }

    info!(
        "Script finished: {} applied, {} rejected, {} events over {}s of block time",
        report.applied,
        report.rejected,
        report.events,
        report.chain_time.as_secs()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{EventIndexer, LocalLedger},
        stakehub_common::{types::Address, StakingConfig},
        stakehub_staking::Call,
        stakehub_store::{MemoryStore, Storage},
    };

    fn tx(block: u64, sender: u8, call: Call) -> Transaction {
        Transaction {
            block,
            timestamp: 1_000 + block as i64 * 12,
            sender: Address::new([sender; 20]),
            call,
        }
    }

    #[tokio::test]
    async fn rejected_transactions_are_skipped() {
        let hub = Arc::new(RwLock::new(StakeHub::new(StakingConfig::default(), Address::ZERO)));
        let validator = Address::new([1; 20]);
        let script = vec![
            tx(1, 1, Call::RegisterValidator {
                name: "Alpha".into(),
                description: String::new(),
                social_links: "{}".into(),
                commission_rate: 500,
            }),
            // duplicate registration
            tx(2, 1, Call::RegisterValidator {
                name: "Alpha".into(),
                description: String::new(),
                social_links: "{}".into(),
                commission_rate: 500,
            }),
            tx(3, 9, Call::Stake { validator, amount: 100 }),
        ];

        let (sender, mut receiver) = mpsc::channel(16);
        let report = execute_script(hub.clone(), script, sender).await.unwrap();
        assert_eq!(report.applied, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.chain_time, Duration::from_secs(24));

        let mut received = 0;
        while receiver.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, report.events);
        assert_eq!(hub.read().await.get_total_staked(), 100);
    }

    #[tokio::test]
    async fn closed_channel_stops_the_script() {
        let hub = Arc::new(RwLock::new(StakeHub::new(StakingConfig::default(), Address::ZERO)));
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);

        let script = vec![tx(1, 1, Call::RegisterValidator {
            name: "Alpha".into(),
            description: String::new(),
            social_links: "{}".into(),
            commission_rate: 500,
        })];
        assert!(execute_script(hub, script, sender).await.is_err());
    }

    fn demo_script() -> Vec<Transaction> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/transactions.json");
        load_script(path).unwrap()
    }

    #[test]
    fn loads_the_demo_script() {
        let transactions = demo_script();
        assert_eq!(transactions.len(), 17);
        assert!(transactions.windows(2).all(|w| w[0].block <= w[1].block));
    }

    #[tokio::test]
    async fn demo_script_is_mirrored_end_to_end() {
        let owner: Address = "0x00000000000000000000000000000000000000ad".parse().unwrap();
        let hub = Arc::new(RwLock::new(StakeHub::new(StakingConfig::default(), owner)));
        let store = Arc::new(MemoryStore::new());
        let indexer = EventIndexer::new(store.clone(), Arc::new(LocalLedger::new(hub.clone())))
            .await
            .unwrap();

        let (sender, receiver) = mpsc::channel(4);
        let indexing = tokio::spawn(indexer.run(receiver));
        let report = execute_script(hub.clone(), demo_script(), sender).await.unwrap();
        let indexer = indexing.await.unwrap().unwrap();

        // excessive commission and a stake with the rejected validator
        assert_eq!(report.rejected, 2);
        assert_eq!(report.applied, 15);
        assert_eq!(report.chain_time, Duration::from_secs(31 * 86_400 + 24));
        assert_eq!(indexer.metrics().lock().unwrap().events_failed, 0);

        let hub = hub.read().await;
        hub.audit().unwrap();

        let mirrored = store.list_validators().await.unwrap();
        assert_eq!(mirrored.len(), hub.get_validator_count());
        for row in &mirrored {
            let live = hub.validator(&row.address).unwrap();
            assert_eq!(row.total_staked, live.total_staked);
            assert_eq!(row.user_count, live.user_count);
            assert_eq!(row.commission_rate, live.commission_rate);
            assert_eq!(row.uptime, live.uptime);
            assert_eq!(row.commission_earned, live.commission_earned);
            for staker in store.get_validator_stakers(&row.address).await.unwrap() {
                let stake = hub.get_user_stake(&staker.user_address, &row.address).unwrap();
                assert_eq!(staker.amount, stake.amount);
                let mirrored = store.get_user_stakes(&staker.user_address).await.unwrap();
                let mirrored = mirrored
                    .iter()
                    .find(|s| s.stake.validator_address == row.address)
                    .unwrap();
                assert_eq!(mirrored.stake.rewards, stake.rewards);
                assert_eq!(mirrored.stake.last_claim, stake.last_claim);
            }
        }

        let heavy: Address = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap();
        let names: Vec<String> = store
            .get_user_badges(&heavy)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        for expected in ["First Stake", "Bulk Staker", "Loyal Staker"] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }

        // the only pool was closed at the end of the script
        assert!(store.list_active_pools().await.unwrap().is_empty());
        assert_eq!(store.referral_count(), 1);
    }
}
