// Cache namespaces.
// Each resource kind owns one versioned storage key.

/// How a namespace lays out its entries under its storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// The storage value is a single entry.
    Single,
    /// The storage value is a map of item key to entry.
    Keyed,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::Keyed => "keyed",
        }
    }
}

/// A versioned cache namespace.
///
/// Bumping `version` changes the storage key, so entries written with an
/// older payload shape are never read back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    name: &'static str,
    version: u32,
    layout: Layout,
}

impl Namespace {
    /// A namespace holding exactly one resource.
    pub const fn single(name: &'static str, version: u32) -> Self {
        Self {
            name,
            version,
            layout: Layout::Single,
        }
    }

    /// A namespace holding one entry per item key.
    pub const fn keyed(name: &'static str, version: u32) -> Self {
        Self {
            name,
            version,
            layout: Layout::Keyed,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// The storage key, e.g. `endstonePluginsCache:v3`.
    pub fn storage_key(&self) -> String {
        format!("{}:v{}", self.name, self.version)
    }
}
