use super::{CredentialStore, NewRefreshToken, RecordId, RefreshTokenRecord, StoreError, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;

const SEQUENCE_KEY: &str = "refresh_token:seq";

// Flips revoked 0 -> 1 and returns 1; returns 0 if already revoked, -1 if missing.
static REVOKE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local revoked = redis.call('HGET', KEYS[1], 'revoked')
        if revoked == false then
            return -1
        end
        if revoked == '0' then
            redis.call('HSET', KEYS[1], 'revoked', '1', 'updated_at', ARGV[1])
            return 1
        end
        return 0
        ",
    )
});

/// Credential store on Redis.
///
/// Layout:
/// - `user:{guid}` hash with field `email`
/// - `refresh_token:seq` counter for record ids
/// - `refresh_token:{id}` hash with the record fields
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        tracing::info!("Connected to Redis credential store");
        Ok(RedisStore { conn })
    }
}

fn user_key(guid: &str) -> String {
    format!("user:{}", guid)
}

fn token_key(id: RecordId) -> String {
    format!("refresh_token:{}", id)
}

fn record_fields(record: &RefreshTokenRecord) -> Vec<(&'static str, String)> {
    vec![
        ("id", record.id.to_string()),
        ("token", record.token_hash.clone()),
        ("user_guid", record.user_guid.clone()),
        ("expires_at", record.expires_at.to_rfc3339()),
        ("created_at", record.created_at.to_rfc3339()),
        ("updated_at", record.updated_at.to_rfc3339()),
        ("ip", record.ip.clone()),
        ("revoked", if record.revoked { "1" } else { "0" }.to_string()),
    ]
}

fn parse_record(key: &str, mut fields: HashMap<String, String>) -> Result<RefreshTokenRecord, StoreError> {
    let mut take = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| StoreError::corrupt(key, format!("missing field {}", name)))
    };
    let timestamp = |value: String| {
        DateTime::parse_from_rfc3339(&value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StoreError::corrupt(key, e.to_string()))
    };

    let id: RecordId = take("id")?
        .parse()
        .map_err(|_| StoreError::corrupt(key, "bad id"))?;
    let token_hash = take("token")?;
    let user_guid = take("user_guid")?;
    let expires_at = timestamp(take("expires_at")?)?;
    let created_at = timestamp(take("created_at")?)?;
    let updated_at = timestamp(take("updated_at")?)?;
    let ip = take("ip")?;
    let revoked = match take("revoked")?.as_str() {
        "0" => false,
        "1" => true,
        other => return Err(StoreError::corrupt(key, format!("bad revoked flag {}", other))),
    };

    Ok(RefreshTokenRecord {
        id,
        token_hash,
        user_guid,
        expires_at,
        created_at,
        updated_at,
        ip,
        revoked,
    })
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn find_user_by_id(&self, id: &str) -> Result<User, StoreError> {
        let mut conn = self.conn.clone();
        let email: Option<String> = conn.hget(user_key(id), "email").await?;

        email
            .map(|email| User::new(id, email))
            .ok_or(StoreError::NotFound)
    }

    async fn put_user(&self, user: User) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(user_key(&user.guid), "email", &user.email)
            .await?;
        Ok(())
    }

    async fn insert_refresh_token(&self, record: NewRefreshToken) -> Result<RecordId, StoreError> {
        let mut conn = self.conn.clone();
        let id: RecordId = conn.incr(SEQUENCE_KEY, 1).await?;
        let record = RefreshTokenRecord::from_new(id, record, Utc::now());

        let fields = record_fields(&record);
        conn.hset_multiple::<_, _, _, ()>(token_key(id), &fields)
            .await?;

        tracing::debug!(rid = id, user_id = %record.user_guid, "Stored refresh token record");
        Ok(id)
    }

    async fn find_refresh_token(
        &self,
        id: RecordId,
        user_id: &str,
    ) -> Result<RefreshTokenRecord, StoreError> {
        let mut conn = self.conn.clone();
        let key = token_key(id);
        let fields: HashMap<String, String> = conn.hgetall(&key).await?;
        if fields.is_empty() {
            return Err(StoreError::NotFound);
        }

        let record = parse_record(&key, fields)?;
        if record.user_guid != user_id {
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    async fn mark_revoked(&self, id: RecordId) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let changed: i64 = REVOKE_SCRIPT
            .key(token_key(id))
            .arg(Utc::now().to_rfc3339())
            .invoke_async(&mut conn)
            .await?;

        match changed {
            1 => Ok(true),
            0 => Ok(false),
            _ => Err(StoreError::NotFound),
        }
    }
}
