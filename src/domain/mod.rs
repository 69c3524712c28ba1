//! Domain layer
//!
//! Pure contact types and calendar logic with no infrastructure dependencies.

pub mod contact;

pub use contact::{
    is_birthday_upcoming, next_birthday, upcoming_birthdays, Contact, ContactId, ContactSearch,
    ContactUpdate, NewContact, BIRTHDAY_WINDOW_DAYS,
};
