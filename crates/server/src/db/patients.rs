//! `PostgreSQL` patient store.
//!
//! Queries are checked at runtime (`query_as::<_, Row>`), and the listing query
//! is assembled with [`QueryBuilder`] so the search filter and sort column can
//! vary. Sort columns come from a fixed set of static strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use patient_registry_core::{
    Email, FullName, ListQuery, NewPatient, Patient, PatientId, PhoneCountryCode, PhoneNumber,
    SortField, escape_like,
};

use super::{PatientStore, RepositoryError};

const PATIENT_COLUMNS: &str = "id, full_name, email, phone_country_code, phone_number, \
                               document_photo_url, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` patient queries.
#[derive(Debug, sqlx::FromRow)]
struct PatientRow {
    id: Uuid,
    full_name: String,
    email: String,
    phone_country_code: String,
    phone_number: String,
    document_photo_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = RepositoryError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let full_name = FullName::parse(&row.full_name).map_err(|e| corrupt("full name", e))?;
        let email = Email::parse(&row.email).map_err(|e| corrupt("email", e))?;
        let phone_country_code = PhoneCountryCode::parse(&row.phone_country_code)
            .map_err(|e| corrupt("phone country code", e))?;
        let phone_number =
            PhoneNumber::parse(&row.phone_number).map_err(|e| corrupt("phone number", e))?;

        Ok(Self {
            id: PatientId::new(row.id),
            full_name,
            email,
            phone_country_code,
            phone_number,
            document_photo_url: row.document_photo_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn corrupt(field: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {field} in database: {e}"))
}

// =============================================================================
// Store
// =============================================================================

/// Patient store backed by the `patients` table.
#[derive(Debug, Clone)]
pub struct PgPatientStore {
    pool: PgPool,
}

impl PgPatientStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// SQL expression to order by. Text columns sort case-insensitively.
const fn sort_expression(field: SortField) -> &'static str {
    match field {
        SortField::FullName => "LOWER(full_name)",
        SortField::Email => "LOWER(email)",
        SortField::CreatedAt => "created_at",
    }
}

/// Append the `WHERE` clause for a search term, if any.
fn push_search_filter(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(term) = search {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(" WHERE full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR email ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn list(&self, query: &ListQuery) -> Result<(Vec<Patient>, u64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM patients");
        push_search_filter(&mut count, query.search());
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(PATIENT_COLUMNS).push(" FROM patients");
        push_search_filter(&mut select, query.search());
        select
            .push(" ORDER BY ")
            .push(sort_expression(query.sort_by()))
            .push(" ")
            .push(query.order().as_sql())
            .push(", id ASC LIMIT ")
            .push_bind(i64::from(query.limit()))
            .push(" OFFSET ")
            .push_bind(i64::from(query.offset()));

        let rows: Vec<PatientRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let patients = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((patients, u64::try_from(total).unwrap_or_default()))
    }

    async fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, RepositoryError> {
        let row = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Patient>, RepositoryError> {
        let row = sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert(
        &self,
        patient: &NewPatient,
        document_photo_url: &str,
    ) -> Result<Patient, RepositoryError> {
        let result = sqlx::query_as::<_, PatientRow>(&format!(
            "INSERT INTO patients \
                 (full_name, email, phone_country_code, phone_number, document_photo_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PATIENT_COLUMNS}"
        ))
        .bind(patient.full_name().as_str())
        .bind(patient.email())
        .bind(patient.phone_country_code().as_str())
        .bind(patient.phone_number().as_str())
        .bind(document_photo_url)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.try_into(),
            Err(e) => {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return Err(RepositoryError::Conflict(
                        "Email already registered".to_string(),
                    ));
                }
                Err(RepositoryError::Database(e))
            }
        }
    }

    async fn delete(&self, id: PatientId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        sqlx::query("TRUNCATE TABLE patients")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use patient_registry_core::SortOrder;

    use super::*;

    fn row() -> PatientRow {
        PatientRow {
            id: Uuid::new_v4(),
            full_name: "Juan Perez".to_string(),
            email: "juan@gmail.com".to_string(),
            phone_country_code: "+54".to_string(),
            phone_number: "1122334455".to_string(),
            document_photo_url: "/uploads/patient-1-2.jpg".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let patient = Patient::try_from(row()).unwrap();
        assert_eq!(patient.full_name.as_str(), "Juan Perez");
        assert_eq!(patient.full_phone_number(), "+541122334455");
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let mut bad = row();
        bad.phone_number = "12-34".to_string();
        let err = Patient::try_from(bad).unwrap_err();
        assert!(
            matches!(err, RepositoryError::DataCorruption(ref msg) if msg.contains("phone number"))
        );
    }

    #[test]
    fn test_sort_expression_is_static() {
        assert_eq!(sort_expression(SortField::FullName), "LOWER(full_name)");
        assert_eq!(sort_expression(SortField::Email), "LOWER(email)");
        assert_eq!(sort_expression(SortField::CreatedAt), "created_at");
    }

    #[test]
    fn test_list_sql_shape() {
        let query = ListQuery::new(
            5,
            10,
            Some("50%_off".to_string()),
            SortField::FullName,
            SortOrder::Asc,
        )
        .unwrap();

        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM patients");
        push_search_filter(&mut builder, query.search());
        let sql = builder.sql();

        assert_eq!(
            sql,
            "SELECT id FROM patients WHERE full_name ILIKE $1 ESCAPE '\\' OR email ILIKE $2 ESCAPE '\\'"
        );
    }
}
