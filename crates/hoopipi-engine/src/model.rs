//! The opaque neural model abstraction.
//!
//! The engine never knows what kind of model it is running — only that it
//! can process a buffer in place, accept a maximum block size, and report a
//! recommended output trim. Loading from disk is a separate concern
//! ([`ModelLoader`]) so the on-disk format never leaks into this crate.

use std::path::Path;
use std::sync::Arc;

use crate::error::ModelLoadError;

/// A loaded, ready-to-run model.
///
/// Implementations must be safe to call from the real-time thread: no
/// allocation, no locking, and no blocking I/O inside [`Model::process`].
pub trait Model: Send + Sync {
    /// Processes `buf` in place.
    fn process(&self, buf: &mut [f32]);

    /// The model's self-reported output trim in dB, folded into the slot's
    /// normalisation gain alongside the engine's fixed −6 dB headroom.
    fn recommended_trim_db(&self) -> f32;
}

/// Identity passthrough, used as the default/test double for a model slot
/// before a real model is loaded.
#[derive(Debug, Default)]
pub struct NullModel;

impl Model for NullModel {
    fn process(&self, _buf: &mut [f32]) {}

    fn recommended_trim_db(&self) -> f32 {
        0.0
    }
}

/// Loads a model from disk. Kept separate from [`Model`] so the slot and the
/// engine never need to know the on-disk format.
///
/// `max_block_size` is the largest number of frames the slot will ever pass
/// to [`Model::process`] in one call (the engine's configured max period,
/// §4.2 step 4: "configure the model's max buffer size"); the loader passes
/// it to the model at construction time so any internal scratch space is
/// sized once, off the RT path, rather than through a later `&mut self`
/// call that couldn't reach a model already shared via `Arc`.
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path, max_block_size: usize) -> Result<Arc<dyn Model + Send + Sync>, ModelLoadError>;
}

/// A loader that always produces a [`NullModel`], regardless of path.
/// Useful for tests and for a build with no real model backend wired in.
#[derive(Debug, Default)]
pub struct NullModelLoader;

impl ModelLoader for NullModelLoader {
    fn load(&self, _path: &Path, _max_block_size: usize) -> Result<Arc<dyn Model + Send + Sync>, ModelLoadError> {
        Ok(Arc::new(NullModel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_model_is_identity() {
        let model = NullModel;
        let mut buf = vec![0.1, -0.2, 0.3];
        let original = buf.clone();
        model.process(&mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn null_loader_always_succeeds() {
        let loader = NullModelLoader;
        let model = loader.load(Path::new("/does/not/exist"), 256).unwrap();
        let mut buf = vec![1.0];
        model.process(&mut buf);
        assert_eq!(buf, vec![1.0]);
    }
}
