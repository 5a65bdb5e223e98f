//! The event ledger: idempotent ingestion, retraction, and listing.
//!
//! Every write keeps its transaction minimal (one existence check plus one
//! row write) and enqueues a recomputation task for the touched
//! `(user, category)` pair before committing, so a task can only become
//! visible together with the write that triggered it.

use chrono::Utc;
use serde::Serialize;

use lode_core::category::EventCategory;
use lode_core::error::CoreError;
use lode_core::types::{DbId, Timestamp};
use lode_db::models::block::Block;
use lode_db::models::event::{CreateEventRow, Event, LifecycleState};
use lode_db::repositories::{BlockRepo, DepositRepo, EventRepo};
use lode_db::DbPool;
use lode_queue::TaskQueue;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::tasks::{UpdatePointsPayload, UPDATE_POINTS_TASK};

/// Default page size for event listings.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum page size for event listings.
pub const MAX_LIMIT: i64 = 100;

/// The external identity of an event's source. At most one per event; this
/// is the idempotency key for repeat sightings.
#[derive(Debug, Clone)]
pub enum ExternalRef {
    Block(DbId),
    Deposit(DbId),
    Url(String),
}

/// Input to [`EventLedger::create`].
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub category: EventCategory,
    pub user_id: DbId,
    /// Explicit point override. Defaults to the catalog value, and is the
    /// only way an event can carry negative points.
    pub points: Option<i64>,
    /// Defaults to now.
    pub occurred_at: Option<Timestamp>,
    pub external: Option<ExternalRef>,
}

/// Compact block representation attached to block-mined events.
#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub id: DbId,
    pub hash: String,
    pub sequence: i64,
    pub difficulty: i64,
    pub main: bool,
    pub timestamp: Timestamp,
    pub transactions_count: i32,
}

impl From<&Block> for BlockSummary {
    fn from(block: &Block) -> Self {
        Self {
            id: block.id,
            hash: block.hash.clone(),
            sequence: block.sequence,
            difficulty: block.difficulty,
            main: block.main,
            timestamp: block.timestamp,
            transactions_count: block.transactions_count,
        }
    }
}

/// External-identity metadata attached to a returned event. Exactly one
/// shape per record, matching whichever identity field is set.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventMetadata {
    Block(BlockSummary),
    Deposit {
        transaction_hash: String,
        block_hash: String,
    },
    Url {
        url: String,
    },
}

/// A ledger event enriched with its external-identity metadata.
#[derive(Debug, Clone, Serialize)]
pub struct EventWithMetadata {
    #[serde(flatten)]
    pub event: Event,
    pub metadata: Option<EventMetadata>,
}

/// Result of a create request.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(EventWithMetadata),
    /// The event occurred outside the eligibility window. Accepted but not
    /// recorded; not an error.
    Ineligible,
}

impl CreateOutcome {
    /// The created event, if one was recorded.
    pub fn into_event(self) -> Option<EventWithMetadata> {
        match self {
            CreateOutcome::Created(event) => Some(event),
            CreateOutcome::Ineligible => None,
        }
    }
}

/// Cursor-pagination input for [`EventLedger::list`].
#[derive(Debug, Clone, Default)]
pub struct ListEvents {
    /// Walk backwards from this event ID (mutually exclusive with `after`).
    pub before: Option<DbId>,
    /// Walk forwards from this event ID.
    pub after: Option<DbId>,
    pub limit: Option<i64>,
}

/// One page of a user's events.
#[derive(Debug, Serialize)]
pub struct EventPage {
    pub data: Vec<EventWithMetadata>,
    pub has_next: bool,
    pub has_previous: bool,
}

/// The event ledger service.
///
/// Cheaply cloneable; holds the store pool and the task-queue collaborator.
#[derive(Clone)]
pub struct EventLedger {
    pool: DbPool,
    queue: TaskQueue,
    config: LedgerConfig,
}

impl EventLedger {
    pub fn new(pool: DbPool, queue: TaskQueue, config: LedgerConfig) -> Self {
        Self { pool, queue, config }
    }

    /// Find an event by ID.
    pub async fn find(&self, id: DbId) -> LedgerResult<EventWithMetadata> {
        let event = EventRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Event", id })?;
        let metadata = self.metadata_for(&event).await?;
        Ok(EventWithMetadata { event, metadata })
    }

    /// Record a sighting of an event, idempotently per external key.
    ///
    /// If an active event already holds the external key, its point value is
    /// updated in place when it differs; otherwise a new event is inserted.
    /// Existence check and write share one transaction, and the partial
    /// unique indexes turn concurrent duplicate inserts into a surfaced
    /// conflict rather than a second row.
    pub async fn create(&self, input: NewEvent) -> LedgerResult<CreateOutcome> {
        let occurred_at = input.occurred_at.unwrap_or_else(Utc::now);
        if !self.config.eligibility.allows(occurred_at) {
            tracing::debug!(
                user_id = input.user_id,
                category = %input.category,
                %occurred_at,
                "Event outside eligibility window, not recorded"
            );
            return Ok(CreateOutcome::Ineligible);
        }

        let points = input
            .points
            .unwrap_or_else(|| input.category.default_points());

        let mut tx = self.pool.begin().await?;

        // Resolve the external identity: the existing active holder of the
        // key (if any) plus the metadata shape for the response.
        let (existing, metadata, block_id, deposit_id, url) = match &input.external {
            Some(ExternalRef::Block(id)) => {
                let block = BlockRepo::find_by_id(&mut *tx, *id).await?.ok_or_else(|| {
                    CoreError::InternalConsistency(format!("Event references missing block {id}"))
                })?;
                let existing = EventRepo::find_active_by_block_id(&mut *tx, *id).await?;
                (
                    existing,
                    Some(EventMetadata::Block(BlockSummary::from(&block))),
                    Some(*id),
                    None,
                    None,
                )
            }
            Some(ExternalRef::Deposit(id)) => {
                let deposit = DepositRepo::find_by_id(&mut *tx, *id).await?.ok_or_else(|| {
                    CoreError::InternalConsistency(format!("Event references missing deposit {id}"))
                })?;
                let existing = EventRepo::find_active_by_deposit_id(&mut *tx, *id).await?;
                (
                    existing,
                    Some(EventMetadata::Deposit {
                        transaction_hash: deposit.transaction_hash,
                        block_hash: deposit.block_hash,
                    }),
                    None,
                    Some(*id),
                    None,
                )
            }
            Some(ExternalRef::Url(url)) => {
                let existing = EventRepo::find_active_by_url(&mut *tx, url).await?;
                (
                    existing,
                    Some(EventMetadata::Url { url: url.clone() }),
                    None,
                    None,
                    Some(url.clone()),
                )
            }
            None => (None, None, None, None, None),
        };

        let event = match existing {
            // Repeat sighting with a changed value: update in place.
            Some(existing) if existing.points != points => {
                EventRepo::update_points(&mut *tx, existing.id, points).await?
            }
            // Repeat sighting, nothing to change.
            Some(existing) => existing,
            None => {
                let inserted = EventRepo::insert(
                    &mut *tx,
                    &CreateEventRow {
                        category: input.category,
                        user_id: input.user_id,
                        points,
                        occurred_at,
                        block_id,
                        deposit_id,
                        url,
                    },
                )
                .await;
                match inserted {
                    // A concurrent upsert for the same external key won the
                    // race past our existence check. Surface it, don't merge.
                    Err(err) if is_unique_violation(&err) => {
                        return Err(CoreError::Conflict(
                            "An active event already holds this external key".to_string(),
                        )
                        .into());
                    }
                    other => other?,
                }
            }
        };

        self.enqueue_recompute(&mut tx, event.user_id, event.category)
            .await?;
        tx.commit().await?;

        tracing::info!(
            event_id = event.id,
            user_id = event.user_id,
            category = %event.category,
            points = event.points,
            "Event recorded"
        );

        Ok(CreateOutcome::Created(EventWithMetadata { event, metadata }))
    }

    /// Retract an event: zero its points and mark it deleted, preserving the
    /// row for audit history. Idempotent — retracting an already-retracted
    /// event returns the stored state unchanged.
    pub async fn retract(&self, id: DbId) -> LedgerResult<Event> {
        let event = EventRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Event", id })?;

        if event.lifecycle() == LifecycleState::Retracted {
            return Ok(event);
        }

        let mut tx = self.pool.begin().await?;
        let retracted = match EventRepo::soft_delete(&mut *tx, event.id).await? {
            Some(retracted) => retracted,
            // Lost a race against another retraction; nothing left to do.
            None => {
                tx.rollback().await?;
                return Ok(EventRepo::find_by_id(&self.pool, id)
                    .await?
                    .ok_or(CoreError::NotFound { entity: "Event", id })?);
            }
        };

        self.enqueue_recompute(&mut tx, retracted.user_id, retracted.category)
            .await?;
        tx.commit().await?;

        tracing::info!(
            event_id = retracted.id,
            user_id = retracted.user_id,
            category = %retracted.category,
            "Event retracted"
        );

        Ok(retracted)
    }

    /// List a user's active events, newest first, with boundary flags.
    ///
    /// `has_next` / `has_previous` are computed by probing one row beyond
    /// each end of the returned page.
    pub async fn list(&self, user_id: DbId, options: &ListEvents) -> LedgerResult<EventPage> {
        let limit = options.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let events = match (options.before, options.after) {
            (Some(before), _) => {
                let cursor = self.cursor_position(before).await?;
                let mut page = EventRepo::page_before(&self.pool, user_id, cursor, limit).await?;
                page.reverse();
                page
            }
            (None, Some(after)) => {
                let cursor = self.cursor_position(after).await?;
                EventRepo::page_after(&self.pool, user_id, Some(cursor), limit).await?
            }
            (None, None) => EventRepo::page_after(&self.pool, user_id, None, limit).await?,
        };

        let (has_next, has_previous) = match (events.first(), events.last()) {
            (Some(first), Some(last)) => (
                EventRepo::exists_after(&self.pool, user_id, (last.occurred_at, last.id)).await?,
                EventRepo::exists_before(&self.pool, user_id, (first.occurred_at, first.id))
                    .await?,
            ),
            _ => (false, false),
        };

        let mut data = Vec::with_capacity(events.len());
        for event in events {
            let metadata = self.metadata_for(&event).await?;
            data.push(EventWithMetadata { event, metadata });
        }

        Ok(EventPage { data, has_next, has_previous })
    }

    /// Grant block-mined points for a block, subject to the gating rules.
    ///
    /// Returns [`CreateOutcome::Ineligible`] when block-mined points are
    /// disabled or the block lies past the end-of-phase sequence cap.
    pub async fn upsert_block_mined(
        &self,
        block: &Block,
        user_id: DbId,
    ) -> LedgerResult<CreateOutcome> {
        if !self.config.allow_block_mined_points
            || block.sequence > self.config.block_mined_sequence_cap
        {
            return Ok(CreateOutcome::Ineligible);
        }
        self.create(NewEvent {
            category: EventCategory::BlockMined,
            user_id,
            points: Some(EventCategory::BlockMined.default_points()),
            occurred_at: Some(block.timestamp),
            external: Some(ExternalRef::Block(block.id)),
        })
        .await
    }

    /// Withdraw the points for a block that left the main chain.
    ///
    /// Returns the retracted event, or `None` if no active event holds the
    /// block.
    pub async fn retract_block_mined(&self, block_id: DbId) -> LedgerResult<Option<Event>> {
        match EventRepo::find_active_by_block_id(&self.pool, block_id).await? {
            Some(event) => Ok(Some(self.retract(event.id).await?)),
            None => Ok(None),
        }
    }

    /// Record a node-uptime reward. Uptime events carry no external
    /// identity; every report is a fresh event at catalog points.
    pub async fn create_node_uptime(
        &self,
        user_id: DbId,
        occurred_at: Timestamp,
    ) -> LedgerResult<CreateOutcome> {
        self.create(NewEvent {
            category: EventCategory::NodeUptime,
            user_id,
            points: Some(EventCategory::NodeUptime.default_points()),
            occurred_at: Some(occurred_at),
            external: None,
        })
        .await
    }

    /// Resolve a cursor event ID to its `(occurred_at, id)` page position.
    async fn cursor_position(&self, id: DbId) -> LedgerResult<(Timestamp, DbId)> {
        let event = EventRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Event", id })?;
        Ok((event.occurred_at, event.id))
    }

    /// Resolve the metadata shape for an event's external identity.
    ///
    /// A reference that no longer resolves is a broken foreign-key invariant
    /// and propagates as an internal-consistency fault.
    async fn metadata_for(&self, event: &Event) -> LedgerResult<Option<EventMetadata>> {
        if let Some(block_id) = event.block_id {
            let block = BlockRepo::find_by_id(&self.pool, block_id)
                .await?
                .ok_or_else(|| {
                    CoreError::InternalConsistency(format!(
                        "Event {} references missing block {block_id}",
                        event.id
                    ))
                })?;
            return Ok(Some(EventMetadata::Block(BlockSummary::from(&block))));
        }
        if let Some(deposit_id) = event.deposit_id {
            let deposit = DepositRepo::find_by_id(&self.pool, deposit_id)
                .await?
                .ok_or_else(|| {
                    CoreError::InternalConsistency(format!(
                        "Event {} references missing deposit {deposit_id}",
                        event.id
                    ))
                })?;
            return Ok(Some(EventMetadata::Deposit {
                transaction_hash: deposit.transaction_hash,
                block_hash: deposit.block_hash,
            }));
        }
        if let Some(url) = &event.url {
            return Ok(Some(EventMetadata::Url { url: url.clone() }));
        }
        Ok(None)
    }

    /// Enqueue a deduplicated recomputation task inside the caller's
    /// transaction. Fire-and-forget: the ledger never awaits the result.
    async fn enqueue_recompute(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: DbId,
        category: EventCategory,
    ) -> Result<(), LedgerError> {
        let payload = UpdatePointsPayload { user_id, category };
        let payload_json = serde_json::to_value(&payload)
            .map_err(|e| CoreError::InternalConsistency(format!("Unserializable payload: {e}")))?;
        self.queue
            .enqueue(
                &mut **tx,
                UPDATE_POINTS_TASK,
                &payload_json,
                Some(&payload.dedupe_key()),
            )
            .await?;
        Ok(())
    }
}

/// Whether a sqlx error is a PostgreSQL unique-constraint violation (23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
