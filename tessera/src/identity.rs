use core::fmt::Debug;
use core::hash::Hash;
use std::collections::HashMap;

use tracing::error;

use crate::ErrorKind;

/// A bijection between native locations and dynamic handles, scoped to one
/// marshal or unmarshal call.
///
/// `N` identifies a native value, `D` a dynamic one. Registering either side
/// twice with different partners is an engine bug and is reported as
/// [`ErrorKind::IdentityConflict`].
#[derive(Debug)]
pub struct IdentityMap<N, D> {
    forward: HashMap<N, D>,
    backward: HashMap<D, N>,
}

impl<N, D> Default for IdentityMap<N, D> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            backward: HashMap::new(),
        }
    }
}

impl<N, D> IdentityMap<N, D>
where
    N: Copy + Eq + Hash + Debug,
    D: Copy + Eq + Hash + Debug,
{
    /// An empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// The dynamic handle a native value was converted to
    pub fn lookup_native(&self, native: &N) -> Option<D> {
        self.forward.get(native).copied()
    }

    /// The native value a dynamic handle was converted to
    pub fn lookup_dynamic(&self, dynamic: &D) -> Option<N> {
        self.backward.get(dynamic).copied()
    }

    /// Number of registered pairs
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether nothing was registered yet
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Records that `native` and `dynamic` are the same value. Registering
    /// the same pair again is a no-op.
    pub fn register(&mut self, native: N, dynamic: D) -> Result<(), ErrorKind> {
        if let Some(existing) = self.forward.get(&native) {
            if *existing == dynamic {
                return Ok(());
            }
            return Err(conflict(format!(
                "{native:?} is already mapped to {existing:?}, not {dynamic:?}"
            )));
        }
        if let Some(existing) = self.backward.get(&dynamic) {
            return Err(conflict(format!(
                "{dynamic:?} is already mapped to {existing:?}, not {native:?}"
            )));
        }
        self.forward.insert(native, dynamic);
        self.backward.insert(dynamic, native);
        Ok(())
    }
}

fn conflict(detail: String) -> ErrorKind {
    error!("identity map conflict: {detail}");
    ErrorKind::IdentityConflict { detail }
}
