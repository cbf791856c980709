pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod compositor;
pub(crate) mod cpu;
pub(crate) mod plan;
pub(crate) mod surface;
pub(crate) mod text;
