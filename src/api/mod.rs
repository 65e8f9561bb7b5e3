pub(crate) mod auth;
pub(crate) mod cookies;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod extract;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod offline_sites;
pub(crate) mod router;
pub(crate) mod users;
