pub(crate) mod decode;
pub(crate) mod ingest;
pub(crate) mod payload;
