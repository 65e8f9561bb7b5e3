pub(crate) mod courses;
pub(crate) mod enrollment_requests;
pub(crate) mod enrollments;
pub(crate) mod exams;
pub(crate) mod offline_sites;
pub(crate) mod submissions;
pub(crate) mod users;
