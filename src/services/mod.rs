//! Collaborators of the auth gateway and the contacts API.

pub mod contacts;
pub mod email;
pub mod media;

pub use contacts::ContactService;
pub use email::{EmailSender, LogEmailSender};
pub use media::{LocalMediaStore, MediaError, MediaStore};
