use std::ops::{Deref, DerefMut};

use crate::error::Result;

use super::Pipeline;

/// Which attributes a [`StateScope`] saves and restores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Tracked {
    pub model_matrix: bool,
    pub material: bool,
    pub texture: bool,
    pub color: bool,
}

impl Tracked {
    pub const NONE: Tracked = Tracked {
        model_matrix: false,
        material: false,
        texture: false,
        color: false,
    };
    pub const MODEL_MATRIX: Tracked = Tracked {
        model_matrix: true,
        ..Tracked::NONE
    };
    pub const COLOR: Tracked = Tracked {
        color: true,
        ..Tracked::NONE
    };
    /// Model matrix, material and texture.
    pub const SHADED: Tracked = Tracked {
        model_matrix: true,
        material: true,
        texture: true,
        color: false,
    };
    pub const ALL: Tracked = Tracked {
        model_matrix: true,
        material: true,
        texture: true,
        color: true,
    };
}

/// Guard returned by [`Pipeline::scope`].
///
/// Derefs to the pipeline so the scoped code keeps full access to it. The
/// pushed attributes are popped by [`StateScope::exit`], or on drop when the
/// scope is left early (for instance through `?`); pop errors on drop can
/// only be logged.
pub struct StateScope<'p> {
    pipeline: &'p mut Pipeline,
    tracked: Tracked,
    open: bool,
}

impl<'p> StateScope<'p> {
    pub(super) fn enter(pipeline: &'p mut Pipeline, tracked: Tracked) -> Self {
        if tracked.model_matrix {
            pipeline.push_model_matrix();
        }
        if tracked.material {
            pipeline.push_material();
        }
        if tracked.texture {
            pipeline.push_texture();
        }
        if tracked.color {
            pipeline.push_color();
        }
        Self {
            pipeline,
            tracked,
            open: true,
        }
    }

    /// Pops everything this scope pushed, in reverse order. Every pop is
    /// attempted; the first error is returned.
    pub fn exit(mut self) -> Result<()> {
        self.open = false;
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        let mut pops: Vec<Result<()>> = Vec::with_capacity(4);
        if self.tracked.color {
            pops.push(self.pipeline.pop_color());
        }
        if self.tracked.texture {
            pops.push(self.pipeline.pop_texture());
        }
        if self.tracked.material {
            pops.push(self.pipeline.pop_material());
        }
        if self.tracked.model_matrix {
            pops.push(self.pipeline.pop_model_matrix());
        }
        pops.into_iter().collect()
    }
}

impl Deref for StateScope<'_> {
    type Target = Pipeline;

    fn deref(&self) -> &Pipeline {
        &*self.pipeline
    }
}

impl DerefMut for StateScope<'_> {
    fn deref_mut(&mut self) -> &mut Pipeline {
        &mut *self.pipeline
    }
}

impl Drop for StateScope<'_> {
    fn drop(&mut self) {
        if self.open {
            self.open = false;
            if let Err(e) = self.restore() {
                log::error!("state scope left unbalanced: {e}");
            }
        }
    }
}
