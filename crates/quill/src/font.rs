use std::hash::{Hash, Hasher};

/// Resolved location of a font record inside a font cache.
///
/// `cache` identifies the cache that produced the slot so a handle moved between
/// caches re-resolves instead of indexing a foreign record table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontSlot {
    pub cache: u32,
    pub index: u32,
}

/// A caller-owned font selection: family/style name plus pixel size.
///
/// The `slot` is filled in by the font cache on first use and gives direct
/// access to the cached record afterwards. Changing the name or size clears it.
#[derive(Clone, Debug)]
pub struct Font {
    name: String,
    size: u32,
    slot: Option<FontSlot>,
}

impl Font {
    /// `name` is the "<family> <style>" string reported by the font file,
    /// e.g. `"Roboto Regular"`.
    pub fn new(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
            slot: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.slot = None;
    }

    /// Pixel size.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
        self.slot = None;
    }

    /// For use by the font cache.
    pub fn slot(&self) -> Option<FontSlot> {
        self.slot
    }

    /// For use by the font cache.
    pub fn set_slot(&mut self, slot: FontSlot) {
        self.slot = Some(slot);
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.name == other.name
    }
}

impl Eq for Font {}

impl Hash for Font {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size.hash(state);
    }
}
