use tessera_core::{Def, ListDef, Shape};

use crate::Peek;

#[derive(Clone, Copy)]
enum Backing {
    List(ListDef),
    Contiguous { len: usize, stride: usize },
}

/// Lets you read from a list, an array or a slice
#[derive(Clone, Copy)]
pub struct PeekListLike<'mem> {
    value: Peek<'mem>,
    t: &'static Shape,
    backing: Backing,
}

impl core::fmt::Debug for PeekListLike<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeekListLike")
            .field("shape", &self.value.shape)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<'mem> PeekListLike<'mem> {
    pub(crate) fn new(value: Peek<'mem>) -> Option<Self> {
        let (t, backing) = match value.shape.def {
            Def::List(def) => (def.t(), Backing::List(def)),
            Def::Array(def) => (def.t(), Backing::Contiguous {
                len: def.n,
                stride: def.t().layout.sized_layout().ok()?.size(),
            }),
            Def::Slice(def) => (def.t(), Backing::Contiguous {
                len: value.data.len(),
                stride: def.t().layout.sized_layout().ok()?.size(),
            }),
            _ => return None,
        };
        Some(Self { value, t, backing })
    }

    /// Shape of the items
    #[inline]
    pub fn item_shape(&self) -> &'static Shape {
        self.t
    }

    /// Number of items
    pub fn len(&self) -> usize {
        match self.backing {
            Backing::List(def) => unsafe { (def.vtable.len)(self.value.data) },
            Backing::Contiguous { len, .. } => len,
        }
    }

    /// Whether there are no items
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`
    pub fn get(&self, index: usize) -> Option<Peek<'mem>> {
        let data = match self.backing {
            Backing::List(def) => unsafe { (def.vtable.get)(self.value.data, index)? },
            Backing::Contiguous { len, stride } => {
                if index >= len {
                    return None;
                }
                unsafe { self.value.data.field(index * stride) }
            }
        };
        Some(unsafe { Peek::unchecked_new(data, self.t) })
    }

    /// All items, in order
    pub fn iter(&self) -> impl Iterator<Item = Peek<'mem>> + use<'mem> {
        let this = *self;
        (0..this.len()).filter_map(move |index| this.get(index))
    }
}
