pub(crate) mod kv;
pub(crate) mod quota;
pub(crate) mod schema;
