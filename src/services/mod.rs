//! Typed access to backend resources.

mod user_api;
mod users;

pub use user_api::{User, UserApi, UserFormData, UserPatch};
pub use users::UserService;
