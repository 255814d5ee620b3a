//! Application-wide names and backend endpoints.

pub const APP_NAME: &str = "My Rust App";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct Endpoints {
    pub users: &'static str,
    pub posts: &'static str,
    pub comments: &'static str,
}

pub const API_ENDPOINTS: Endpoints = Endpoints {
    users: "/users",
    posts: "/posts",
    comments: "/comments",
};
