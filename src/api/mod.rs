pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod router;

mod assignments;
mod grades;
mod students;
mod sync;
