pub(crate) mod role_policy;
pub(crate) mod sync;
