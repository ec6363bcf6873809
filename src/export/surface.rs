use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::card::tree::CardTree;
use crate::foundation::error::{CardError, CardResult};

/// Kinds of export scaffolding that can be attached to a [`HostDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachedKind {
    DetachedContainer,
    IsolatedSurface,
}

#[derive(Debug)]
struct DocState {
    next_id: u64,
    attached: BTreeMap<u64, AttachedKind>,
}

/// The document export scaffolding is attached to.
///
/// Containers and surfaces are RAII guards: dropping one removes it from the document, so
/// every exit path of an export tears down what it created.
#[derive(Clone, Debug)]
pub struct HostDocument {
    state: Arc<Mutex<DocState>>,
    isolated_surfaces: bool,
}

impl Default for HostDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDocument {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DocState {
                next_id: 0,
                attached: BTreeMap::new(),
            })),
            isolated_surfaces: true,
        }
    }

    /// A document whose isolated surfaces cannot be accessed.
    pub fn without_isolated_surfaces() -> Self {
        Self {
            isolated_surfaces: false,
            ..Self::new()
        }
    }

    pub fn attached(&self) -> Vec<AttachedKind> {
        self.lock().attached.values().copied().collect()
    }

    pub fn attached_count(&self) -> usize {
        self.lock().attached.len()
    }

    /// Off-screen container for rendering a card before its markup is captured.
    pub fn create_detached_container(&self) -> DetachedContainer {
        DetachedContainer {
            handle: self.attach(AttachedKind::DetachedContainer),
            tree: None,
        }
    }

    /// Blank, style-free surface of `width`x`height` logical units.
    pub fn create_isolated_surface(&self, width: u32, height: u32) -> CardResult<IsolatedSurface> {
        if !self.isolated_surfaces {
            return Err(CardError::surface_unavailable(
                "isolated surface document is not accessible",
            ));
        }
        if width == 0 || height == 0 {
            return Err(CardError::validation("isolated surface size must be > 0"));
        }
        Ok(IsolatedSurface {
            handle: self.attach(AttachedKind::IsolatedSurface),
            width,
            height,
            root: None,
        })
    }

    fn attach(&self, kind: AttachedKind) -> AttachHandle {
        let mut st = self.lock();
        let id = st.next_id;
        st.next_id += 1;
        st.attached.insert(id, kind);
        tracing::trace!(id, ?kind, "attached");
        AttachHandle {
            state: self.state.clone(),
            id,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DocState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<DocState>) -> MutexGuard<'_, DocState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct AttachHandle {
    state: Arc<Mutex<DocState>>,
    id: u64,
}

impl Drop for AttachHandle {
    fn drop(&mut self) {
        let kind = lock_state(&self.state).attached.remove(&self.id);
        tracing::trace!(id = self.id, ?kind, "detached");
    }
}

/// Holds a live card render until its markup has been captured.
#[derive(Debug)]
pub struct DetachedContainer {
    handle: AttachHandle,
    tree: Option<CardTree>,
}

impl DetachedContainer {
    pub fn render(&mut self, tree: CardTree) {
        self.tree = Some(tree);
    }

    /// Static markup of the current render.
    pub fn markup(&self) -> CardResult<String> {
        self.tree
            .as_ref()
            .ok_or_else(|| CardError::rasterization("detached container is empty"))?
            .to_markup()
    }

    pub fn id(&self) -> u64 {
        self.handle.id
    }
}

/// Style-free rendering surface holding a frozen copy of the card.
#[derive(Debug)]
pub struct IsolatedSurface {
    handle: AttachHandle,
    width: u32,
    height: u32,
    root: Option<CardTree>,
}

impl IsolatedSurface {
    /// Replace the surface content with `markup`.
    pub fn write(&mut self, markup: &str) -> CardResult<()> {
        let tree = CardTree::from_markup(markup)?;
        if (tree.width, tree.height) != (self.width, self.height) {
            tracing::debug!(
                surface_w = self.width,
                surface_h = self.height,
                tree_w = tree.width,
                tree_h = tree.height,
                "markup size differs from surface; surface size wins"
            );
        }
        self.root = Some(CardTree {
            width: self.width,
            height: self.height,
            root: tree.root,
        });
        Ok(())
    }

    pub fn root(&self) -> CardResult<&CardTree> {
        self.root
            .as_ref()
            .ok_or_else(|| CardError::rasterization("isolated surface has no content"))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn id(&self) -> u64 {
        self.handle.id
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/surface.rs"]
mod tests;
