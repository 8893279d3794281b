//! PostgreSQL implementation of the persistence layer.
//!
//! Reservation writes run in a transaction that first takes
//! `pg_advisory_xact_lock(RESERVATION_LOCK_NAMESPACE, room_id)`. Writers of
//! the same room queue on that lock; writers of different rooms do not
//! contend. The room row is read `FOR KEY SHARE` so a concurrent room
//! delete cannot slip between the existence check and the insert. Updates
//! re-read their target row `FOR UPDATE` inside the transaction and merge
//! the patch over that row.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{ReservationRow, RoomRow};
use super::{ReservationRepository, RoomRepository};
use crate::config::ServiceConfig;
use chrono::NaiveDateTime;

use crate::domain::{
    NewReservation, NewRoom, Reservation, ReservationId, ReservationPatch, Room, RoomId,
    RoomPatch, TimeSlot,
};
use crate::error::BookingError;
use crate::validation::validate_reservation_update;

/// First key of the two-key advisory lock; the second key is the room id.
const RESERVATION_LOCK_NAMESPACE: i32 = 0x524d_4253;

const ROOM_COLUMNS: &str = "id, name, description";
const RESERVATION_COLUMNS: &str = "id, meetingroom_id, from_reserve, to_reserve";

/// PostgreSQL-backed repositories using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresStore {
    /// Wraps an existing pool. Every repository call is abandoned with
    /// [`BookingError::StoreUnavailable`] once `timeout` elapses.
    #[must_use]
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the database cannot be reached within
    /// the configured acquire timeout.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool, config.store_timeout))
    }

    /// Applies the embedded migrations from `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns the migrator error if a migration fails or the recorded
    /// history diverges from the embedded files.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, BookingError>
    where
        F: Future<Output = Result<T, BookingError>> + Send,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or_else(|_| {
                tracing::warn!(operation, timeout = ?self.timeout, "store call timed out");
                Err(BookingError::StoreUnavailable(format!("{operation} timed out")))
            })
    }
}

/// Maps driver failures that carry no domain meaning.
fn store_error(err: sqlx::Error) -> BookingError {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => BookingError::StoreUnavailable(err.to_string()),
        other => BookingError::Internal(other.to_string()),
    }
}

/// Like [`store_error`], but a unique violation means the name is taken.
fn room_write_error(err: sqlx::Error, name: &str) -> BookingError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            BookingError::DuplicateRoomName(name.to_string())
        }
        other => store_error(other),
    }
}

/// Like [`store_error`], but a foreign key violation means the room is gone.
fn reservation_write_error(err: sqlx::Error, room_id: RoomId) -> BookingError {
    match err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            BookingError::RoomNotFound(room_id)
        }
        other => store_error(other),
    }
}

impl PostgresStore {
    /// Serializes writers of one room and verifies the room still exists.
    async fn lock_room(
        tx: &mut sqlx::PgConnection,
        room_id: RoomId,
    ) -> Result<(), BookingError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(RESERVATION_LOCK_NAMESPACE)
            .bind(room_id.get())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM meetingroom WHERE id = $1 FOR KEY SHARE")
            .bind(room_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?
            .map(|_| ())
            .ok_or(BookingError::RoomNotFound(room_id))
    }

    /// First reservation of `room_id` intersecting `slot`, skipping `exclude`.
    async fn first_conflict(
        tx: &mut sqlx::PgConnection,
        room_id: RoomId,
        slot: TimeSlot,
        exclude: Option<ReservationId>,
    ) -> Result<Option<ReservationId>, BookingError> {
        let conflict = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM reservation \
             WHERE meetingroom_id = $1 \
               AND ($2::int4 IS NULL OR id <> $2) \
               AND from_reserve < $4 \
               AND to_reserve > $3 \
             ORDER BY from_reserve, id \
             LIMIT 1",
        )
        .bind(room_id.get())
        .bind(exclude.map(ReservationId::get))
        .bind(slot.from)
        .bind(slot.to)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        Ok(conflict.map(ReservationId::new))
    }
}

#[async_trait]
impl RoomRepository for PostgresStore {
    async fn create(&self, room: NewRoom) -> Result<Room, BookingError> {
        self.bounded("room.create", async {
            let sql = format!(
                "INSERT INTO meetingroom (name, description) VALUES ($1, $2) RETURNING {ROOM_COLUMNS}"
            );
            sqlx::query_as::<_, RoomRow>(&sql)
                .bind(&room.name)
                .bind(&room.description)
                .fetch_one(&self.pool)
                .await
                .map(Room::from)
                .map_err(|e| room_write_error(e, &room.name))
        })
        .await
    }

    async fn get_by_id(&self, id: RoomId) -> Result<Room, BookingError> {
        self.bounded("room.get", async {
            let sql = format!("SELECT {ROOM_COLUMNS} FROM meetingroom WHERE id = $1");
            sqlx::query_as::<_, RoomRow>(&sql)
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?
                .map(Room::from)
                .ok_or(BookingError::RoomNotFound(id))
        })
        .await
    }

    async fn get_id_by_name(&self, name: &str) -> Result<Option<RoomId>, BookingError> {
        self.bounded("room.get_id_by_name", async {
            let id = sqlx::query_scalar::<_, i32>("SELECT id FROM meetingroom WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(id.map(RoomId::new))
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Room>, BookingError> {
        self.bounded("room.list", async {
            let sql = format!("SELECT {ROOM_COLUMNS} FROM meetingroom ORDER BY id");
            let rows = sqlx::query_as::<_, RoomRow>(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(rows.into_iter().map(Room::from).collect())
        })
        .await
    }

    async fn update(&self, existing: Room, patch: RoomPatch) -> Result<Room, BookingError> {
        self.bounded("room.update", async {
            let mut tx = self.pool.begin().await.map_err(store_error)?;

            let select = format!("SELECT {ROOM_COLUMNS} FROM meetingroom WHERE id = $1 FOR UPDATE");
            let current = sqlx::query_as::<_, RoomRow>(&select)
                .bind(existing.id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_error)?
                .map(Room::from)
                .ok_or(BookingError::RoomNotFound(existing.id))?;
            let target = current.patched(patch);

            let sql = format!(
                "UPDATE meetingroom SET name = $2, description = $3 WHERE id = $1 \
                 RETURNING {ROOM_COLUMNS}"
            );
            let row = sqlx::query_as::<_, RoomRow>(&sql)
                .bind(target.id.get())
                .bind(&target.name)
                .bind(&target.description)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| room_write_error(e, &target.name))?;

            tx.commit().await.map_err(store_error)?;
            Ok(Room::from(row))
        })
        .await
    }

    async fn delete(&self, existing: Room) -> Result<Room, BookingError> {
        self.bounded("room.delete", async {
            let result = sqlx::query("DELETE FROM meetingroom WHERE id = $1")
                .bind(existing.id.get())
                .execute(&self.pool)
                .await
                .map_err(store_error)?;
            if result.rows_affected() == 0 {
                return Err(BookingError::RoomNotFound(existing.id));
            }
            Ok(existing)
        })
        .await
    }
}

#[async_trait]
impl ReservationRepository for PostgresStore {
    async fn create(&self, reservation: NewReservation) -> Result<Reservation, BookingError> {
        self.bounded("reservation.create", async {
            let NewReservation { room_id, slot } = reservation;
            let mut tx = self.pool.begin().await.map_err(store_error)?;

            Self::lock_room(&mut *tx, room_id).await?;
            if let Some(conflicting) = Self::first_conflict(&mut *tx, room_id, slot, None).await? {
                return Err(BookingError::Overlap {
                    room_id,
                    conflicting,
                });
            }

            let sql = format!(
                "INSERT INTO reservation (meetingroom_id, from_reserve, to_reserve) \
                 VALUES ($1, $2, $3) RETURNING {RESERVATION_COLUMNS}"
            );
            let row = sqlx::query_as::<_, ReservationRow>(&sql)
                .bind(room_id.get())
                .bind(slot.from)
                .bind(slot.to)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| reservation_write_error(e, room_id))?;

            tx.commit().await.map_err(store_error)?;
            Ok(Reservation::from(row))
        })
        .await
    }

    async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<Reservation>, BookingError> {
        self.bounded("reservation.list_for_room", async {
            let sql = format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservation \
                 WHERE meetingroom_id = $1 ORDER BY from_reserve, id"
            );
            let rows = sqlx::query_as::<_, ReservationRow>(&sql)
                .bind(room_id.get())
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(rows.into_iter().map(Reservation::from).collect())
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, BookingError> {
        self.bounded("reservation.list", async {
            let sql =
                format!("SELECT {RESERVATION_COLUMNS} FROM reservation ORDER BY from_reserve, id");
            let rows = sqlx::query_as::<_, ReservationRow>(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(rows.into_iter().map(Reservation::from).collect())
        })
        .await
    }

    async fn get_by_id(&self, id: ReservationId) -> Result<Reservation, BookingError> {
        self.bounded("reservation.get", async {
            let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservation WHERE id = $1");
            sqlx::query_as::<_, ReservationRow>(&sql)
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?
                .map(Reservation::from)
                .ok_or(BookingError::ReservationNotFound(id))
        })
        .await
    }

    async fn update(
        &self,
        existing: Reservation,
        patch: ReservationPatch,
        now: NaiveDateTime,
    ) -> Result<Reservation, BookingError> {
        self.bounded("reservation.update", async {
            let room_id = existing.room_id;
            let mut tx = self.pool.begin().await.map_err(store_error)?;

            Self::lock_room(&mut *tx, room_id).await?;
            let select = format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservation WHERE id = $1 FOR UPDATE"
            );
            let current = sqlx::query_as::<_, ReservationRow>(&select)
                .bind(existing.id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_error)?
                .map(Reservation::from)
                .ok_or(BookingError::ReservationNotFound(existing.id))?;
            let slot = validate_reservation_update(&current, &patch, now)?;

            if let Some(conflicting) =
                Self::first_conflict(&mut *tx, room_id, slot, Some(current.id)).await?
            {
                return Err(BookingError::Overlap {
                    room_id,
                    conflicting,
                });
            }

            let sql = format!(
                "UPDATE reservation SET from_reserve = $2, to_reserve = $3 WHERE id = $1 \
                 RETURNING {RESERVATION_COLUMNS}"
            );
            let row = sqlx::query_as::<_, ReservationRow>(&sql)
                .bind(current.id.get())
                .bind(slot.from)
                .bind(slot.to)
                .fetch_one(&mut *tx)
                .await
                .map_err(store_error)?;

            tx.commit().await.map_err(store_error)?;
            Ok(Reservation::from(row))
        })
        .await
    }

    async fn delete(&self, existing: Reservation) -> Result<Reservation, BookingError> {
        self.bounded("reservation.delete", async {
            let result = sqlx::query("DELETE FROM reservation WHERE id = $1")
                .bind(existing.id.get())
                .execute(&self.pool)
                .await
                .map_err(store_error)?;
            if result.rows_affected() == 0 {
                return Err(BookingError::ReservationNotFound(existing.id));
            }
            Ok(existing)
        })
        .await
    }
}
