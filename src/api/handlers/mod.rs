pub mod auth;
pub mod contacts;
pub mod health;
pub mod pagination;
pub mod users;

pub use auth::{
    login_handler, me_handler, request_reset_handler, reset_password_handler, signup_handler,
    verify_email_handler,
};
pub use contacts::{
    create_contact_handler, delete_contact_handler, get_contact_handler, list_contacts_handler,
    search_contacts_handler, upcoming_birthdays_handler, update_contact_handler,
};
pub use health::{health_handler, root_handler};
pub use pagination::{PaginatedResponse, PaginationQuery};
pub use users::{get_user_handler, list_users_handler, update_role_handler, upload_avatar_handler};
