//! Contact repository. Every query is scoped by owner.

use crate::auth::user::UserId;
use crate::domain::{Contact, ContactId, ContactSearch, ContactUpdate, NewContact};
use crate::errors::{ContactbookError, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::instrument;

const CONTACT_COLUMNS: &str =
    "id, owner_id, first_name, last_name, email, phone, birthday, additional_info";

#[derive(Debug, Clone, FromRow)]
struct ContactRow {
    pub id: i64,
    pub owner_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: Option<NaiveDate>,
    pub additional_info: Option<String>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Contact {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            birthday: row.birthday,
            additional_info: row.additional_info,
            owner_id: row.owner_id,
        }
    }
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Create a contact owned by `owner`
    async fn create(&self, owner: UserId, contact: NewContact) -> Result<Contact>;

    /// All contacts of `owner`, ordered by ID
    async fn list(&self, owner: UserId) -> Result<Vec<Contact>>;

    /// One contact, or None if absent or owned by someone else
    async fn get(&self, owner: UserId, id: ContactId) -> Result<Option<Contact>>;

    /// Apply a partial update; None if absent or owned by someone else
    async fn update(&self, owner: UserId, id: ContactId, update: ContactUpdate)
        -> Result<Option<Contact>>;

    /// Delete a contact; false if absent or owned by someone else
    async fn delete(&self, owner: UserId, id: ContactId) -> Result<bool>;

    /// Case-insensitive substring search over name and email
    async fn search(&self, owner: UserId, search: ContactSearch) -> Result<Vec<Contact>>;

    /// Contacts of `owner` that have a birthday set
    async fn list_with_birthday(&self, owner: UserId) -> Result<Vec<Contact>>;
}

#[derive(Debug, Clone)]
pub struct SqlxContactRepository {
    pool: DbPool,
}

impl SqlxContactRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term.to_lowercase().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    #[instrument(skip(self, contact), name = "db_create_contact")]
    async fn create(&self, owner: UserId, contact: NewContact) -> Result<Contact> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO contacts (owner_id, first_name, last_name, email, phone, birthday, additional_info, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(owner)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(contact.birthday)
        .bind(&contact.additional_info)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| ContactbookError::Database {
            source: err,
            context: "Failed to create contact".to_string(),
        })?;

        self.get(owner, result.last_insert_rowid())
            .await?
            .ok_or_else(|| ContactbookError::internal("Contact not found after creation"))
    }

    #[instrument(skip(self), name = "db_list_contacts")]
    async fn list(&self, owner: UserId) -> Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {} FROM contacts WHERE owner_id = $1 ORDER BY id",
            CONTACT_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| ContactbookError::Database {
            source: err,
            context: "Failed to list contacts".to_string(),
        })?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }

    #[instrument(skip(self), name = "db_get_contact")]
    async fn get(&self, owner: UserId, id: ContactId) -> Result<Option<Contact>> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {} FROM contacts WHERE id = $1 AND owner_id = $2",
            CONTACT_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| ContactbookError::Database {
            source: err,
            context: "Failed to fetch contact".to_string(),
        })?;

        Ok(row.map(Contact::from))
    }

    #[instrument(skip(self, update), name = "db_update_contact")]
    async fn update(
        &self,
        owner: UserId,
        id: ContactId,
        update: ContactUpdate,
    ) -> Result<Option<Contact>> {
        let Some(mut contact) = self.get(owner, id).await? else {
            return Ok(None);
        };

        if update.is_empty() {
            return Ok(Some(contact));
        }
        update.apply_to(&mut contact);

        sqlx::query(
            r#"
            UPDATE contacts
            SET first_name = $1, last_name = $2, email = $3, phone = $4,
                birthday = $5, additional_info = $6, updated_at = $7
            WHERE id = $8 AND owner_id = $9
            "#,
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(contact.birthday)
        .bind(&contact.additional_info)
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await
        .map_err(|err| ContactbookError::Database {
            source: err,
            context: "Failed to update contact".to_string(),
        })?;

        self.get(owner, id).await
    }

    #[instrument(skip(self), name = "db_delete_contact")]
    async fn delete(&self, owner: UserId, id: ContactId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(|err| ContactbookError::Database {
                source: err,
                context: "Failed to delete contact".to_string(),
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, search), name = "db_search_contacts")]
    async fn search(&self, owner: UserId, search: ContactSearch) -> Result<Vec<Contact>> {
        let search = search.normalized();

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM contacts WHERE owner_id = ", CONTACT_COLUMNS));
        builder.push_bind(owner);

        for (column, term) in [
            ("first_name", &search.first_name),
            ("last_name", &search.last_name),
            ("email", &search.email),
        ] {
            if let Some(term) = term {
                builder.push(format!(" AND LOWER({}) LIKE ", column));
                builder.push_bind(like_pattern(term));
                builder.push(" ESCAPE '\\'");
            }
        }
        builder.push(" ORDER BY id");

        let rows = builder
            .build_query_as::<ContactRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| ContactbookError::Database {
                source: err,
                context: "Failed to search contacts".to_string(),
            })?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }

    #[instrument(skip(self), name = "db_list_contacts_with_birthday")]
    async fn list_with_birthday(&self, owner: UserId) -> Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {} FROM contacts WHERE owner_id = $1 AND birthday IS NOT NULL ORDER BY id",
            CONTACT_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| ContactbookError::Database {
            source: err,
            context: "Failed to list contact birthdays".to_string(),
        })?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }
}
