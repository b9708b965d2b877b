//! Software graphics device.
//!
//! Holds the mutable pipeline state shared by every draw (active program, bound target, blend
//! and stencil modes) and the table of linked programs. Render operations acquire the state
//! through [`Device::scope`], which restores it when the scope ends.

use std::ops::{Deref, DerefMut};

use crate::foundation::error::{PenError, PenResult};
use crate::render::surface::{BlendMode, StencilMode};

/// Handle of a linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(u32);

/// Type of a declared attribute or uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec4`
    Vec4,
    /// `sampler2D`
    Sampler2D,
}

/// Declared interface of a program.
#[derive(Clone, Copy, Debug)]
pub struct ProgramDesc {
    /// Program name, used in diagnostics.
    pub name: &'static str,
    /// Per-vertex inputs.
    pub attributes: &'static [(&'static str, ValueKind)],
    /// Uniform inputs.
    pub uniforms: &'static [(&'static str, ValueKind)],
}

impl ProgramDesc {
    /// Kind of the uniform named `name`, if declared.
    pub fn uniform(&self, name: &str) -> Option<ValueKind> {
        self.uniforms
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, k)| *k)
    }

    /// Kind of the attribute named `name`, if declared.
    pub fn attribute(&self, name: &str) -> Option<ValueKind> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, k)| *k)
    }

    /// Fail unless `name` is declared as a uniform of `kind`.
    pub(crate) fn require_uniform(&self, name: &str, kind: ValueKind) -> PenResult<()> {
        match self.uniform(name) {
            Some(k) if k == kind => Ok(()),
            Some(k) => Err(PenError::shader(format!(
                "{}: uniform {name} declared as {k:?}, expected {kind:?}",
                self.name
            ))),
            None => Err(PenError::shader(format!(
                "{}: missing uniform {name}",
                self.name
            ))),
        }
    }

    /// Fail unless `name` is declared as an attribute of `kind`.
    pub(crate) fn require_attribute(&self, name: &str, kind: ValueKind) -> PenResult<()> {
        match self.attribute(name) {
            Some(k) if k == kind => Ok(()),
            _ => Err(PenError::shader(format!(
                "{}: missing attribute {name}: {kind:?}",
                self.name
            ))),
        }
    }
}

/// Which surface draws are directed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// The presentation surface owned by the external scene renderer.
    Screen,
    /// The persistent pen canvas.
    PenCanvas,
    /// The reusable collision scratch canvas.
    CollisionScratch,
}

/// Global pipeline state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineState {
    /// Active program, if any.
    pub program: Option<ProgramId>,
    /// Bound target.
    pub target: TargetKind,
    /// Active blend mode.
    pub blend: BlendMode,
    /// Active stencil mode.
    pub stencil: StencilMode,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            program: None,
            target: TargetKind::Screen,
            blend: BlendMode::Alpha,
            stencil: StencilMode::Disabled,
        }
    }
}

/// Counters for device activity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceStats {
    /// Times a different program became active.
    pub program_switches: u64,
    /// Individual uniform values sent to a program.
    pub uniform_uploads: u64,
}

/// Software graphics device.
#[derive(Debug, Default)]
pub struct Device {
    state: PipelineState,
    programs: Vec<ProgramDesc>,
    stats: DeviceStats,
}

impl Device {
    /// Create a device in the default state with no programs linked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pipeline state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Activity counters.
    pub fn stats(&self) -> DeviceStats {
        self.stats.clone()
    }

    /// Link a program after checking its declared interface is well formed.
    pub fn link(&mut self, desc: ProgramDesc) -> PenResult<ProgramId> {
        if desc.name.is_empty() {
            return Err(PenError::shader("program name must be non-empty"));
        }
        let names = desc
            .attributes
            .iter()
            .chain(desc.uniforms.iter())
            .map(|(n, _)| *n);
        let mut seen: Vec<&str> = Vec::new();
        for n in names {
            if n.is_empty() {
                return Err(PenError::shader(format!("{}: empty input name", desc.name)));
            }
            if seen.contains(&n) {
                return Err(PenError::shader(format!(
                    "{}: input {n} declared twice",
                    desc.name
                )));
            }
            seen.push(n);
        }

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(desc);
        tracing::debug!(program = desc.name, ?id, "linked program");
        Ok(id)
    }

    /// Declared interface of a linked program.
    pub fn program_desc(&self, id: ProgramId) -> Option<&ProgramDesc> {
        self.programs.get(id.0 as usize)
    }

    /// Make `id` the active program.
    ///
    /// Returns `true` when this changed the active program, in which case cached uniform values
    /// for it must be treated as lost.
    pub fn use_program(&mut self, id: ProgramId) -> bool {
        if self.state.program == Some(id) {
            return false;
        }
        self.state.program = Some(id);
        self.stats.program_switches = self.stats.program_switches.saturating_add(1);
        true
    }

    /// Bind the draw target.
    pub fn bind_target(&mut self, target: TargetKind) {
        self.state.target = target;
    }

    /// Set the blend mode.
    pub fn set_blend(&mut self, blend: BlendMode) {
        self.state.blend = blend;
    }

    /// Set the stencil mode.
    pub fn set_stencil(&mut self, stencil: StencilMode) {
        self.state.stencil = stencil;
    }

    pub(crate) fn record_uniform_upload(&mut self) {
        self.stats.uniform_uploads = self.stats.uniform_uploads.saturating_add(1);
    }

    /// Capture the current state; it is restored when the returned scope is dropped.
    pub fn scope(&mut self) -> StateScope<'_> {
        let saved = self.state;
        StateScope {
            device: self,
            saved,
        }
    }
}

/// Scoped acquisition of the device state. Derefs to [`Device`].
#[derive(Debug)]
pub struct StateScope<'a> {
    device: &'a mut Device,
    saved: PipelineState,
}

impl Deref for StateScope<'_> {
    type Target = Device;

    fn deref(&self) -> &Device {
        self.device
    }
}

impl DerefMut for StateScope<'_> {
    fn deref_mut(&mut self) -> &mut Device {
        self.device
    }
}

impl Drop for StateScope<'_> {
    fn drop(&mut self) {
        self.device.state = self.saved;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/device.rs"]
mod tests;
