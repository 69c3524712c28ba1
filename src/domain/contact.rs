//! Contact domain types and the upcoming-birthday calculation.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::user::UserId;

/// Database identifier of a contact
pub type ContactId = i64;

/// Default look-ahead for upcoming birthdays, in days
pub const BIRTHDAY_WINDOW_DAYS: u32 = 7;

/// An address book entry. Always owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Contact {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: Option<NaiveDate>,
    pub additional_info: Option<String>,
    pub owner_id: UserId,
}

/// Payload for creating a contact.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewContact {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 50, message = "Phone must be 1-50 characters"))]
    pub phone: String,

    #[serde(default)]
    pub birthday: Option<NaiveDate>,

    #[serde(default)]
    #[validate(length(max = 255, message = "Additional info must be at most 255 characters"))]
    pub additional_info: Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactUpdate {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,

    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Phone must be 1-50 characters"))]
    pub phone: Option<String>,

    pub birthday: Option<NaiveDate>,

    #[validate(length(max = 255, message = "Additional info must be at most 255 characters"))]
    pub additional_info: Option<String>,
}

impl ContactUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.birthday.is_none()
            && self.additional_info.is_none()
    }

    /// Apply the provided fields to `contact`
    pub fn apply_to(self, contact: &mut Contact) {
        if let Some(first_name) = self.first_name {
            contact.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            contact.last_name = last_name;
        }
        if let Some(email) = self.email {
            contact.email = email;
        }
        if let Some(phone) = self.phone {
            contact.phone = phone;
        }
        if let Some(birthday) = self.birthday {
            contact.birthday = Some(birthday);
        }
        if let Some(additional_info) = self.additional_info {
            contact.additional_info = Some(additional_info);
        }
    }
}

/// Case-insensitive substring filters. Provided filters are combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSearch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ContactSearch {
    /// Filters with blank values dropped
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }
        Self {
            first_name: keep(self.first_name),
            last_name: keep(self.last_name),
            email: keep(self.email),
        }
    }
}

/// The birthday's anniversary in `year`. Feb 29 falls back to Feb 28 in common years.
fn anniversary_in(birthday: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
}

/// The first anniversary of `birthday` on or after `today`
pub fn next_birthday(birthday: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = anniversary_in(birthday, today.year())?;
    if this_year >= today {
        Some(this_year)
    } else {
        anniversary_in(birthday, today.year() + 1)
    }
}

/// True when the next anniversary falls within `[today, today + window_days]`
pub fn is_birthday_upcoming(birthday: NaiveDate, today: NaiveDate, window_days: u32) -> bool {
    let end = today + Duration::days(i64::from(window_days));
    next_birthday(birthday, today).is_some_and(|next| next <= end)
}

/// Contacts with a birthday in the window, soonest first
pub fn upcoming_birthdays(contacts: Vec<Contact>, today: NaiveDate, window_days: u32) -> Vec<Contact> {
    let mut upcoming: Vec<(NaiveDate, Contact)> = contacts
        .into_iter()
        .filter_map(|contact| {
            let birthday = contact.birthday?;
            if is_birthday_upcoming(birthday, today, window_days) {
                next_birthday(birthday, today).map(|next| (next, contact))
            } else {
                None
            }
        })
        .collect();

    upcoming.sort_by(|(a, ca), (b, cb)| a.cmp(b).then(ca.id.cmp(&cb.id)));
    upcoming.into_iter().map(|(_, contact)| contact).collect()
}
