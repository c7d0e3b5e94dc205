/// Guards against oversized or adversarial value graphs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// Deepest nesting accepted (default: 512)
    pub max_depth: usize,
    /// Most nodes visited in one call (default: 1 << 20)
    pub max_nodes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: 512,
            max_nodes: 1 << 20,
        }
    }
}

impl Options {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum number of visited nodes
    pub const fn max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }
}
