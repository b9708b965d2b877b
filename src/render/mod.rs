pub(crate) mod costume;
pub(crate) mod device;
pub(crate) mod painter;
pub(crate) mod shader;
pub(crate) mod surface;
