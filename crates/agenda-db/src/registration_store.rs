//! CRUD on the `registrations` table.
//!
//! Registrations are store-only records: nothing here touches the
//! scheduling engine. Each row references an event and disappears with it.

use agenda_types::{
    EventId, NewRegistration, Registration, RegistrationId, RegistrationStatus,
    RegistrationSummary, RegistrationUpdate,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

const SELECT_COLUMNS: &str =
    "id, event_id, name, email, phone, ticket_type, status, registration_date, check_in_date";

/// Operations on the `registrations` table.
#[derive(Debug, Clone)]
pub struct RegistrationStore {
    pool: PgPool,
}

impl RegistrationStore {
    /// Create a store over a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registrations, newest first, optionally only those for one event.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::InvalidRow`] if a row cannot be converted.
    pub async fn list(&self, event_id: Option<EventId>) -> Result<Vec<Registration>, DbError> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM registrations
             WHERE ($1::uuid IS NULL OR event_id = $1)
             ORDER BY registration_date DESC, id"
        ))
        .bind(event_id.map(EventId::into_inner))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    /// Registrations whose name or email contains `term`, ignoring case.
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub async fn search(&self, term: &str) -> Result<Vec<Registration>, DbError> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM registrations
             WHERE name ILIKE $1 OR email ILIKE $1
             ORDER BY registration_date DESC, id"
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    /// The registration with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or row conversion fails.
    pub async fn get(&self, id: RegistrationId) -> Result<Option<Registration>, DbError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Registration::try_from).transpose()
    }

    /// Insert a registration and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails (including an
    /// `event_id` with no matching event).
    pub async fn insert(&self, new: NewRegistration) -> Result<Registration, DbError> {
        let id = RegistrationId::new();
        // A registration created as checked-in is stamped now.
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "INSERT INTO registrations (id, event_id, name, email, phone, ticket_type, status, check_in_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7,
                     CASE WHEN $7 = 'checked-in' THEN NOW() END)
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(new.event_id.into_inner())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.ticket_type)
        .bind(new.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(%id, event_id = %new.event_id, "Inserted registration");
        Registration::try_from(row)
    }

    /// Replace every client-editable field of a registration.
    ///
    /// Returns `None` when no row has the id. The check-in time is kept
    /// while the status stays checked-in and cleared otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the update or row conversion fails.
    pub async fn update(
        &self,
        id: RegistrationId,
        update: RegistrationUpdate,
    ) -> Result<Option<Registration>, DbError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations
             SET name = $2, email = $3, phone = $4, ticket_type = $5, status = $6,
                 check_in_date = CASE WHEN $6 = 'checked-in'
                                      THEN COALESCE(check_in_date, NOW()) END
             WHERE id = $1
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.ticket_type)
        .bind(update.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(%id, found = row.is_some(), "Updated registration");
        row.map(Registration::try_from).transpose()
    }

    /// Mark an attendee as arrived.
    ///
    /// Checking in twice keeps the first check-in time. Returns `None`
    /// when no row has the id or the registration is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the update or row conversion fails.
    pub async fn check_in(&self, id: RegistrationId) -> Result<Option<Registration>, DbError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations
             SET status = 'checked-in', check_in_date = COALESCE(check_in_date, NOW())
             WHERE id = $1 AND status <> 'cancelled'
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(%id, checked_in = row.is_some(), "Checked in registration");
        row.map(Registration::try_from).transpose()
    }

    /// Delete a registration. Returns `false` when no row had the id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete(&self, id: RegistrationId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        tracing::debug!(%id, deleted, "Deleted registration");
        Ok(deleted)
    }

    /// Attendance counts over every registration.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn summary(&self) -> Result<RegistrationSummary, DbError> {
        let (total, checked_in): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'checked-in')
             FROM registrations",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(summarize(total, checked_in))
    }
}

/// A row from the `registrations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationRow {
    /// Primary key.
    pub id: Uuid,
    /// Referenced event.
    pub event_id: Uuid,
    /// Attendee name.
    pub name: String,
    /// Attendee email.
    pub email: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Ticket tier.
    pub ticket_type: Option<String>,
    /// Status as stored (`kebab-case`).
    pub status: String,
    /// Sign-up time.
    pub registration_date: DateTime<Utc>,
    /// First check-in time.
    pub check_in_date: Option<DateTime<Utc>>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = DbError;

    fn try_from(row: RegistrationRow) -> Result<Self, DbError> {
        let status: RegistrationStatus =
            row.status
                .parse()
                .map_err(|err: agenda_types::UnknownStatus| DbError::InvalidRow {
                    id: row.id,
                    reason: err.to_string(),
                })?;

        Ok(Self {
            id: RegistrationId::from(row.id),
            event_id: EventId::from(row.event_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            ticket_type: row.ticket_type,
            status,
            registered_at: row.registration_date,
            checked_in_at: row.check_in_date,
        })
    }
}

fn convert_all(rows: Vec<RegistrationRow>) -> Result<Vec<Registration>, DbError> {
    let registrations = rows
        .into_iter()
        .map(Registration::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = registrations.len(), "Loaded registrations");
    Ok(registrations)
}

/// `ILIKE` pattern matching `term` anywhere, with its wildcards escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len().saturating_add(2));
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn summarize(total: i64, checked_in: i64) -> RegistrationSummary {
    let total = total.unsigned_abs();
    let checked_in = checked_in.unsigned_abs();
    RegistrationSummary {
        total,
        checked_in,
        pending: total.saturating_sub(checked_in),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(status: &str, checked_in: bool) -> RegistrationRow {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        RegistrationRow {
            id: Uuid::now_v7(),
            event_id: Uuid::now_v7(),
            name: "Grace".to_owned(),
            email: "grace@example.com".to_owned(),
            phone: None,
            ticket_type: Some("vip".to_owned()),
            status: status.to_owned(),
            registration_date: at,
            check_in_date: checked_in.then_some(at),
        }
    }

    #[test]
    fn row_converts_to_registration() {
        let source = row("checked-in", true);
        let registration = Registration::try_from(source.clone()).unwrap();
        assert_eq!(registration.id.into_inner(), source.id);
        assert_eq!(registration.event_id.into_inner(), source.event_id);
        assert_eq!(registration.status, RegistrationStatus::CheckedIn);
        assert_eq!(registration.checked_in_at, source.check_in_date);
        assert_eq!(registration.ticket_type.as_deref(), Some("vip"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = Registration::try_from(row("waitlisted", false));
        assert!(matches!(result, Err(DbError::InvalidRow { .. })));
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ada"), "%ada%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn pending_is_everything_not_checked_in() {
        let summary = summarize(7, 3);
        assert_eq!(summary.total, 7);
        assert_eq!(summary.checked_in, 3);
        assert_eq!(summary.pending, 4);
        assert_eq!(summarize(0, 0), RegistrationSummary::default());
    }
}
