//! Contact service: owner-scoped address book operations.
//!
//! A contact that exists but belongs to another user is reported exactly like
//! a missing one.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};
use validator::Validate;

use crate::auth::user::UserId;
use crate::domain::{
    upcoming_birthdays, Contact, ContactId, ContactSearch, ContactUpdate, NewContact,
};
use crate::errors::{ContactbookError, Result};
use crate::storage::{ContactRepository, DbPool, SqlxContactRepository};

#[derive(Clone)]
pub struct ContactService {
    repository: Arc<dyn ContactRepository>,
}

impl std::fmt::Debug for ContactService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactService").finish_non_exhaustive()
    }
}

fn contact_not_found(id: ContactId) -> ContactbookError {
    ContactbookError::not_found("contact", id.to_string())
}

impl ContactService {
    pub fn new(repository: Arc<dyn ContactRepository>) -> Self {
        Self { repository }
    }

    pub fn with_sqlx(pool: DbPool) -> Self {
        Self::new(Arc::new(SqlxContactRepository::new(pool)))
    }

    #[instrument(skip(self, contact), fields(owner_id = owner))]
    pub async fn create(&self, owner: UserId, contact: NewContact) -> Result<Contact> {
        contact.validate()?;
        let created = self.repository.create(owner, contact).await?;
        info!(contact_id = created.id, "Contact created");
        Ok(created)
    }

    #[instrument(skip(self), fields(owner_id = owner))]
    pub async fn list(&self, owner: UserId) -> Result<Vec<Contact>> {
        self.repository.list(owner).await
    }

    #[instrument(skip(self), fields(owner_id = owner))]
    pub async fn get(&self, owner: UserId, id: ContactId) -> Result<Contact> {
        self.repository.get(owner, id).await?.ok_or_else(|| contact_not_found(id))
    }

    #[instrument(skip(self, update), fields(owner_id = owner))]
    pub async fn update(&self, owner: UserId, id: ContactId, update: ContactUpdate) -> Result<Contact> {
        update.validate()?;
        self.repository.update(owner, id, update).await?.ok_or_else(|| contact_not_found(id))
    }

    #[instrument(skip(self), fields(owner_id = owner))]
    pub async fn delete(&self, owner: UserId, id: ContactId) -> Result<()> {
        if self.repository.delete(owner, id).await? {
            info!(contact_id = id, "Contact deleted");
            Ok(())
        } else {
            Err(contact_not_found(id))
        }
    }

    #[instrument(skip(self, search), fields(owner_id = owner))]
    pub async fn search(&self, owner: UserId, search: ContactSearch) -> Result<Vec<Contact>> {
        self.repository.search(owner, search.normalized()).await
    }

    /// Contacts whose next birthday is within `window_days` of `today`
    #[instrument(skip(self), fields(owner_id = owner))]
    pub async fn upcoming_birthdays(
        &self,
        owner: UserId,
        today: NaiveDate,
        window_days: u32,
    ) -> Result<Vec<Contact>> {
        let contacts = self.repository.list_with_birthday(owner).await?;
        Ok(upcoming_birthdays(contacts, today, window_days))
    }

    /// [`upcoming_birthdays`](Self::upcoming_birthdays) from the current UTC date
    pub async fn upcoming_birthdays_from_today(&self, owner: UserId, window_days: u32) -> Result<Vec<Contact>> {
        self.upcoming_birthdays(owner, Utc::now().date_naive(), window_days).await
    }
}
