pub(crate) mod snap;
