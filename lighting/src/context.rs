//! Per-draw context
//!
//! State carried between the technique, material and geometry phases of a
//! draw: the bound shader pair, the raw technique, and the pipeline state
//! cached for restoration.

use technique_common::RawTechniqueId;

use crate::facade::{BlendMode, DepthMode, RendererFacade};
use crate::frame::FrameState;
use crate::library::ShaderPair;

/// A cached pipeline value awaiting restoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SavedState<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> SavedState<T> {
    /// Take the cached value, leaving the state unset
    pub fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, SavedState::Unset) {
            SavedState::Set(value) => Some(value),
            SavedState::Unset => None,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, SavedState::Set(_))
    }
}

/// Mutable state shared by the three binder phases
#[derive(Debug, Clone, Default)]
pub struct DrawState {
    /// Pair locked by the last successful technique setup
    pub pair: Option<ShaderPair>,
    /// Raw technique of the active pair
    pub raw: RawTechniqueId,
    pub saved_depth: SavedState<DepthMode>,
    pub saved_blend: SavedState<BlendMode>,
    /// Cleared once the land LOD fade completes
    pub land_fade_active: bool,
}

impl DrawState {
    pub fn new() -> Self {
        Self {
            land_fade_active: true,
            ..Self::default()
        }
    }
}

/// Everything a binder phase needs: the device, the frame and the draw state
pub struct DrawContext<'a, R: RendererFacade> {
    pub renderer: &'a mut R,
    pub frame: &'a FrameState,
    pub state: &'a mut DrawState,
}

impl<'a, R: RendererFacade> DrawContext<'a, R> {
    pub fn new(renderer: &'a mut R, frame: &'a FrameState, state: &'a mut DrawState) -> Self {
        Self { renderer, frame, state }
    }
}
