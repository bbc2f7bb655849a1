// crates/stakehub-store/src/postgres_store.rs

use {
    crate::{
        traits::Storage,
        types::{BadgeRecord, NewMessage, PoolRecord, StakeRecord, StakerRecord, UserStakeRecord},
        Result, StoreError,
    },
    async_trait::async_trait,
    sqlx::{
        postgres::{PgPool, PgPoolOptions, PgRow},
        Row,
    },
    stakehub_common::{
        types::{Address, BadgeKind, CommunityPool, EventCursor, Stake, Validator},
        PostgresConfig,
    },
    tracing::{debug, info},
};

/// Amounts are stored as NUMERIC(78, 0) so that any u128 fits; they travel
/// over the wire as text.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS validators (
        address TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        social_links TEXT NOT NULL DEFAULT '{}',
        commission_rate INTEGER NOT NULL,
        total_staked NUMERIC(78, 0) NOT NULL DEFAULT 0,
        uptime INTEGER NOT NULL DEFAULT 9800,
        user_count INTEGER NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        commission_earned NUMERIC(78, 0) NOT NULL DEFAULT 0,
        registered_at TIMESTAMP WITH TIME ZONE NOT NULL,
        last_updated TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stakes (
        id BIGSERIAL PRIMARY KEY,
        user_address TEXT NOT NULL,
        validator_address TEXT NOT NULL REFERENCES validators(address),
        amount NUMERIC(78, 0) NOT NULL,
        since TIMESTAMP WITH TIME ZONE NOT NULL,
        auto_compound BOOLEAN NOT NULL DEFAULT FALSE,
        rewards NUMERIC(78, 0) NOT NULL DEFAULT 0,
        last_claim TIMESTAMP WITH TIME ZONE NOT NULL,
        UNIQUE (user_address, validator_address)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS stakes_user_idx ON stakes(user_address)",
    r#"
    CREATE TABLE IF NOT EXISTS badges (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        level INTEGER NOT NULL,
        UNIQUE (name, level)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_badges (
        user_address TEXT NOT NULL,
        badge_id INTEGER NOT NULL REFERENCES badges(id),
        earned_at TIMESTAMP WITH TIME ZONE NOT NULL,
        PRIMARY KEY (user_address, badge_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id BIGSERIAL PRIMARY KEY,
        from_address TEXT NOT NULL,
        to_address TEXT NOT NULL REFERENCES validators(address),
        content TEXT NOT NULL,
        timestamp TIMESTAMP WITH TIME ZONE NOT NULL,
        read BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS referrals (
        referrer_address TEXT NOT NULL,
        referee_address TEXT NOT NULL,
        timestamp TIMESTAMP WITH TIME ZONE NOT NULL,
        PRIMARY KEY (referrer_address, referee_address)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS community_pools (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        creator_address TEXT NOT NULL,
        total_amount NUMERIC(78, 0) NOT NULL DEFAULT 0,
        member_count INTEGER NOT NULL DEFAULT 0,
        validator_address TEXT REFERENCES validators(address),
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pool_contributions (
        pool_id BIGINT NOT NULL REFERENCES community_pools(id),
        user_address TEXT NOT NULL,
        amount NUMERIC(78, 0) NOT NULL,
        timestamp TIMESTAMP WITH TIME ZONE NOT NULL,
        PRIMARY KEY (pool_id, user_address)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS indexer_state (
        id SMALLINT PRIMARY KEY CHECK (id = 1),
        block_number BIGINT NOT NULL,
        log_index BIGINT NOT NULL,
        last_updated TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
    )
    "#,
];

const VALIDATOR_COLUMNS: &str = r#"
    address, name, description, social_links, commission_rate,
    total_staked::TEXT AS total_staked, uptime, user_count, is_active,
    commission_earned::TEXT AS commission_earned,
    EXTRACT(EPOCH FROM registered_at)::BIGINT AS registered_at
"#;

/// PostgreSQL storage implementation
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.connection_string)
            .await?;

        let store = Self { pool };

        if config.create_tables {
            store.initialize_schema().await?;
        }

        info!("Connected to PostgreSQL mirror");
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        for kind in BadgeKind::ALL {
            sqlx::query(
                "INSERT INTO badges (name, description, level) VALUES ($1, $2, $3) ON CONFLICT (name, level) DO NOTHING",
            )
            .bind(kind.name())
            .bind(kind.description())
            .bind(kind.level() as i32)
            .execute(&self.pool)
            .await?;
        }

        debug!("Mirror schema initialized");
        Ok(())
    }

    fn validator_from_row(row: &PgRow) -> Result<Validator> {
        Ok(Validator {
            address: parse_address(row, "address")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            social_links: row.try_get("social_links")?,
            commission_rate: row.try_get::<i32, _>("commission_rate")? as u16,
            total_staked: parse_amount(row, "total_staked")?,
            uptime: row.try_get::<i32, _>("uptime")? as u16,
            user_count: row.try_get::<i32, _>("user_count")? as u32,
            is_active: row.try_get("is_active")?,
            registered_at: row.try_get("registered_at")?,
            commission_earned: parse_amount(row, "commission_earned")?,
        })
    }

    fn stake_from_row(row: &PgRow) -> Result<StakeRecord> {
        Ok(StakeRecord {
            user_address: parse_address(row, "user_address")?,
            validator_address: parse_address(row, "validator_address")?,
            amount: parse_amount(row, "amount")?,
            since: row.try_get("since")?,
            auto_compound: row.try_get("auto_compound")?,
            rewards: parse_amount(row, "rewards")?,
            last_claim: row.try_get("last_claim")?,
        })
    }
}

fn parse_address(row: &PgRow, column: &str) -> Result<Address> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", column, e)))
}

fn parse_amount(row: &PgRow, column: &str) -> Result<u128> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("{}: not a u128: {}", column, raw)))
}

#[async_trait]
impl Storage for PostgresStore {
    async fn upsert_validator(&self, validator: &Validator) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO validators (address, name, description, social_links, commission_rate,
                                    total_staked, uptime, user_count, is_active, commission_earned, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6::NUMERIC, $7, $8, $9, $10::NUMERIC, to_timestamp($11))
            ON CONFLICT (address)
            DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                social_links = EXCLUDED.social_links,
                commission_rate = EXCLUDED.commission_rate,
                total_staked = EXCLUDED.total_staked,
                uptime = EXCLUDED.uptime,
                user_count = EXCLUDED.user_count,
                is_active = EXCLUDED.is_active,
                commission_earned = EXCLUDED.commission_earned,
                last_updated = CURRENT_TIMESTAMP
            "#,
        )
        .bind(validator.address.to_string())
        .bind(&validator.name)
        .bind(&validator.description)
        .bind(&validator.social_links)
        .bind(validator.commission_rate as i32)
        .bind(validator.total_staked.to_string())
        .bind(validator.uptime as i32)
        .bind(validator.user_count as i32)
        .bind(validator.is_active)
        .bind(validator.commission_earned.to_string())
        .bind(validator.registered_at as f64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_validator_profile(&self, validator: &Validator) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE validators SET
                name = $2,
                description = $3,
                social_links = $4,
                commission_rate = $5,
                uptime = $6,
                is_active = $7,
                last_updated = CURRENT_TIMESTAMP
            WHERE address = $1
            "#,
        )
        .bind(validator.address.to_string())
        .bind(&validator.name)
        .bind(&validator.description)
        .bind(&validator.social_links)
        .bind(validator.commission_rate as i32)
        .bind(validator.uptime as i32)
        .bind(validator.is_active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_validator_totals(&self, validator: &Validator) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE validators SET
                total_staked = $2::NUMERIC,
                user_count = $3,
                commission_earned = $4::NUMERIC,
                last_updated = CURRENT_TIMESTAMP
            WHERE address = $1
            "#,
        )
        .bind(validator.address.to_string())
        .bind(validator.total_staked.to_string())
        .bind(validator.user_count as i32)
        .bind(validator.commission_earned.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("validator {}", validator.address)));
        }
        Ok(())
    }

    async fn upsert_stake(&self, stake: &Stake) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stakes (user_address, validator_address, amount, since, auto_compound, rewards, last_claim)
            VALUES ($1, $2, $3::NUMERIC, to_timestamp($4), $5, $6::NUMERIC, to_timestamp($7))
            ON CONFLICT (user_address, validator_address)
            DO UPDATE SET
                amount = EXCLUDED.amount,
                auto_compound = EXCLUDED.auto_compound,
                rewards = EXCLUDED.rewards,
                last_claim = EXCLUDED.last_claim
            "#,
        )
        .bind(stake.user.to_string())
        .bind(stake.validator.to_string())
        .bind(stake.amount.to_string())
        .bind(stake.since as f64)
        .bind(stake.auto_compound)
        .bind(stake.rewards.to_string())
        .bind(stake.last_claim as f64)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => StoreError::InvalidInput(format!(
                "stake references unknown validator {}",
                stake.validator
            )),
            other => StoreError::Database(other),
        })?;

        Ok(())
    }

    async fn award_badge(&self, user: &Address, name: &str, level: u8, earned_at: i64) -> Result<bool> {
        let description = BadgeKind::from_name_level(name, level)
            .map(|kind| kind.description())
            .unwrap_or(name);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO badges (name, description, level) VALUES ($1, $2, $3) ON CONFLICT (name, level) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .bind(level as i32)
        .execute(&mut *tx)
        .await?;

        let badge_id: i32 = sqlx::query("SELECT id FROM badges WHERE name = $1 AND level = $2")
            .bind(name)
            .bind(level as i32)
            .fetch_one(&mut *tx)
            .await?
            .try_get("id")?;

        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (user_address, badge_id, earned_at)
            VALUES ($1, $2, to_timestamp($3))
            ON CONFLICT (user_address, badge_id) DO NOTHING
            "#,
        )
        .bind(user.to_string())
        .bind(badge_id)
        .bind(earned_at as f64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_pool(&self, pool: &CommunityPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO community_pools (id, name, creator_address, total_amount, member_count,
                                         validator_address, active, created_at)
            VALUES ($1, $2, $3, $4::NUMERIC, $5, $6, $7, to_timestamp($8))
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                total_amount = EXCLUDED.total_amount,
                member_count = EXCLUDED.member_count,
                validator_address = EXCLUDED.validator_address,
                active = EXCLUDED.active
            "#,
        )
        .bind(pool.id as i64)
        .bind(&pool.name)
        .bind(pool.creator.to_string())
        .bind(pool.total_amount.to_string())
        .bind(pool.member_count as i32)
        .bind(pool.validator.map(|v| v.to_string()))
        .bind(pool.active)
        .bind(pool.created_at as f64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_pool_contribution(&self, pool_id: u64, user: &Address, amount: u128, timestamp: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pool_contributions (pool_id, user_address, amount, timestamp)
            VALUES ($1, $2, $3::NUMERIC, to_timestamp($4))
            ON CONFLICT (pool_id, user_address)
            DO UPDATE SET
                amount = EXCLUDED.amount,
                timestamp = EXCLUDED.timestamp
            "#,
        )
        .bind(pool_id as i64)
        .bind(user.to_string())
        .bind(amount.to_string())
        .bind(timestamp as f64)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                StoreError::InvalidInput(format!("contribution references unknown pool {}", pool_id))
            }
            other => StoreError::Database(other),
        })?;

        Ok(())
    }

    async fn insert_referral(&self, referrer: &Address, referee: &Address, timestamp: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO referrals (referrer_address, referee_address, timestamp)
            VALUES ($1, $2, to_timestamp($3))
            ON CONFLICT (referrer_address, referee_address) DO NOTHING
            "#,
        )
        .bind(referrer.to_string())
        .bind(referee.to_string())
        .bind(timestamp as f64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_validators(&self) -> Result<Vec<Validator>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM validators ORDER BY validators.total_staked DESC",
            VALIDATOR_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::validator_from_row).collect()
    }

    async fn get_validator(&self, address: &Address) -> Result<Option<Validator>> {
        let row = sqlx::query(&format!("SELECT {} FROM validators WHERE address = $1", VALIDATOR_COLUMNS))
            .bind(address.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::validator_from_row).transpose()
    }

    async fn get_validator_stakers(&self, validator: &Address) -> Result<Vec<StakerRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT user_address, amount::TEXT AS amount,
                   EXTRACT(EPOCH FROM since)::BIGINT AS since, auto_compound
            FROM stakes
            WHERE validator_address = $1
            ORDER BY stakes.amount DESC
            "#,
        )
        .bind(validator.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<StakerRecord> {
                Ok(StakerRecord {
                    user_address: parse_address(row, "user_address")?,
                    amount: parse_amount(row, "amount")?,
                    since: row.try_get("since")?,
                    auto_compound: row.try_get("auto_compound")?,
                })
            })
            .collect()
    }

    async fn get_user_badges(&self, user: &Address) -> Result<Vec<BadgeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT b.name, b.description, b.level,
                   EXTRACT(EPOCH FROM ub.earned_at)::BIGINT AS earned_at
            FROM user_badges ub
            JOIN badges b ON ub.badge_id = b.id
            WHERE ub.user_address = $1
            ORDER BY ub.earned_at DESC
            "#,
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<BadgeRecord> {
                Ok(BadgeRecord {
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    level: row.try_get::<i32, _>("level")? as u8,
                    earned_at: row.try_get("earned_at")?,
                })
            })
            .collect()
    }

    async fn get_user_stakes(&self, user: &Address) -> Result<Vec<UserStakeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT s.user_address, s.validator_address, s.amount::TEXT AS amount,
                   EXTRACT(EPOCH FROM s.since)::BIGINT AS since, s.auto_compound,
                   s.rewards::TEXT AS rewards,
                   EXTRACT(EPOCH FROM s.last_claim)::BIGINT AS last_claim,
                   v.name AS validator_name, v.uptime, v.commission_rate
            FROM stakes s
            JOIN validators v ON s.validator_address = v.address
            WHERE s.user_address = $1
            "#,
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<UserStakeRecord> {
                Ok(UserStakeRecord {
                    stake: Self::stake_from_row(row)?,
                    validator_name: row.try_get("validator_name")?,
                    uptime: row.try_get::<i32, _>("uptime")? as u16,
                    commission_rate: row.try_get::<i32, _>("commission_rate")? as u16,
                })
            })
            .collect()
    }

    async fn insert_message(&self, message: NewMessage) -> Result<u64> {
        if message.content.trim().is_empty() {
            return Err(StoreError::InvalidInput("message content is empty".into()));
        }

        let known = sqlx::query("SELECT 1 FROM validators WHERE address = $1")
            .bind(message.to_address.to_string())
            .fetch_optional(&self.pool)
            .await?;
        if known.is_none() {
            return Err(StoreError::NotFound(format!("validator {}", message.to_address)));
        }

        let id: i64 = sqlx::query(
            r#"
            INSERT INTO messages (from_address, to_address, content, timestamp)
            VALUES ($1, $2, $3, to_timestamp($4))
            RETURNING id
            "#,
        )
        .bind(message.from_address.to_string())
        .bind(message.to_address.to_string())
        .bind(&message.content)
        .bind(message.timestamp as f64)
        .fetch_one(&self.pool)
        .await?
        .try_get("id")?;

        Ok(id as u64)
    }

    async fn list_active_pools(&self) -> Result<Vec<PoolRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT cp.id, cp.name, cp.creator_address, cp.total_amount::TEXT AS total_amount,
                   cp.member_count, cp.validator_address, cp.active,
                   EXTRACT(EPOCH FROM cp.created_at)::BIGINT AS created_at,
                   v.name AS validator_name
            FROM community_pools cp
            LEFT JOIN validators v ON cp.validator_address = v.address
            WHERE cp.active = TRUE
            ORDER BY cp.total_amount DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<PoolRecord> {
                let validator = row
                    .try_get::<Option<String>, _>("validator_address")?
                    .map(|raw| raw.parse::<Address>())
                    .transpose()
                    .map_err(|e| StoreError::Corrupt(format!("validator_address: {}", e)))?;
                Ok(PoolRecord {
                    pool: CommunityPool {
                        id: row.try_get::<i64, _>("id")? as u64,
                        name: row.try_get("name")?,
                        creator: parse_address(row, "creator_address")?,
                        total_amount: parse_amount(row, "total_amount")?,
                        member_count: row.try_get::<i32, _>("member_count")? as u32,
                        validator,
                        active: row.try_get("active")?,
                        created_at: row.try_get("created_at")?,
                    },
                    validator_name: row.try_get("validator_name")?,
                })
            })
            .collect()
    }

    async fn load_cursor(&self) -> Result<Option<EventCursor>> {
        let row = sqlx::query("SELECT block_number, log_index FROM indexer_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(EventCursor {
                block_number: row.try_get::<i64, _>("block_number")? as u64,
                log_index: row.try_get::<i64, _>("log_index")? as u32,
            })),
            None => Ok(None),
        }
    }

    async fn save_cursor(&self, cursor: EventCursor) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO indexer_state (id, block_number, log_index)
            VALUES (1, $1, $2)
            ON CONFLICT (id)
            DO UPDATE SET
                block_number = EXCLUDED.block_number,
                log_index = EXCLUDED.log_index,
                last_updated = CURRENT_TIMESTAMP
            "#,
        )
        .bind(cursor.block_number as i64)
        .bind(cursor.log_index as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
