pub(crate) mod color;
pub(crate) mod path;
pub(crate) mod renderer;
pub(crate) mod state;
