//! Pooled visual handles.
//!
//! The simulation never draws. Each live enemy, projectile, and storm carries a
//! `Visual` whose render intent is rewritten every tick; the backing handle comes
//! from an external `VisualProvider` and is recycled through a `Pool` instead of
//! being requested again for every spawn.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use rampart_core::enums::VisualKind;

/// Opaque handle issued by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// Presentation-side source of visual handles.
pub trait VisualProvider: Send {
    fn acquire(&mut self, kind: VisualKind) -> VisualHandle;
    fn release(&mut self, handle: VisualHandle);
}

/// Provider for headless runs: hands out sequential ids and counts live handles.
#[derive(Debug, Default)]
pub struct HeadlessVisuals {
    next: u64,
    live: usize,
}

impl HeadlessVisuals {
    pub fn live(&self) -> usize {
        self.live
    }
}

impl VisualProvider for HeadlessVisuals {
    fn acquire(&mut self, _kind: VisualKind) -> VisualHandle {
        self.next += 1;
        self.live += 1;
        VisualHandle(self.next)
    }

    fn release(&mut self, _handle: VisualHandle) {
        self.live = self.live.saturating_sub(1);
    }
}

/// Objects that can be returned to a pool and handed out again.
pub trait Reset {
    /// Clear all per-occupant state.
    fn reset(&mut self);
}

/// What the presentation layer should show for one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderIntent {
    pub visible: bool,
    pub position: DVec2,
    pub scale: f64,
    /// Health or travel fraction, 0.0 - 1.0.
    pub fill: f64,
    pub frozen: bool,
    pub poisoned: bool,
    pub burning: bool,
    pub boss: bool,
}

/// A pooled visual attached to an entity as a component.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub handle: VisualHandle,
    pub kind: VisualKind,
    pub intent: RenderIntent,
}

impl Visual {
    pub fn new(handle: VisualHandle, kind: VisualKind) -> Self {
        Self {
            handle,
            kind,
            intent: RenderIntent::default(),
        }
    }
}

impl Reset for Visual {
    fn reset(&mut self) {
        self.intent = RenderIntent::default();
    }
}

/// Free list of reusable objects.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    outstanding: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self {
            free: Vec::new(),
            outstanding: 0,
        }
    }
}

impl<T: Reset> Pool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a free object, or build one with `create` when none is free.
    pub fn acquire_or(&mut self, create: impl FnOnce() -> T) -> T {
        self.outstanding += 1;
        self.free.pop().unwrap_or_else(create)
    }

    /// Return an object. It is reset before it can be handed out again.
    pub fn release(&mut self, mut item: T) {
        item.reset();
        self.outstanding = self.outstanding.saturating_sub(1);
        self.free.push(item);
    }

    /// Objects waiting for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Objects handed out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Remove all free objects.
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.free.drain(..)
    }
}

/// Usage counters for one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub available: usize,
    pub outstanding: usize,
}

/// The three visual pools and the provider that backs them.
pub struct EntityPools {
    enemies: Pool<Visual>,
    projectiles: Pool<Visual>,
    storms: Pool<Visual>,
    provider: Box<dyn VisualProvider>,
}

impl EntityPools {
    pub fn new(provider: Box<dyn VisualProvider>) -> Self {
        Self {
            enemies: Pool::new(),
            projectiles: Pool::new(),
            storms: Pool::new(),
            provider,
        }
    }

    pub fn headless() -> Self {
        Self::new(Box::new(HeadlessVisuals::default()))
    }

    pub fn acquire(&mut self, kind: VisualKind) -> Visual {
        let provider = &mut self.provider;
        let pool = match kind {
            VisualKind::Enemy => &mut self.enemies,
            VisualKind::Projectile => &mut self.projectiles,
            VisualKind::Storm => &mut self.storms,
        };
        let mut visual = pool.acquire_or(|| Visual::new(provider.acquire(kind), kind));
        visual.intent.visible = true;
        visual
    }

    pub fn release(&mut self, visual: Visual) {
        match visual.kind {
            VisualKind::Enemy => self.enemies.release(visual),
            VisualKind::Projectile => self.projectiles.release(visual),
            VisualKind::Storm => self.storms.release(visual),
        }
    }

    pub fn stats(&self, kind: VisualKind) -> PoolStats {
        let pool = match kind {
            VisualKind::Enemy => &self.enemies,
            VisualKind::Projectile => &self.projectiles,
            VisualKind::Storm => &self.storms,
        };
        PoolStats {
            available: pool.available(),
            outstanding: pool.outstanding(),
        }
    }

    /// Hand every pooled handle back to the provider.
    pub fn shutdown(&mut self) {
        for pool in [&mut self.enemies, &mut self.projectiles, &mut self.storms] {
            for visual in pool.drain() {
                self.provider.release(visual.handle);
            }
        }
    }
}

impl std::fmt::Debug for EntityPools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityPools")
            .field("enemies", &self.stats(VisualKind::Enemy))
            .field("projectiles", &self.stats(VisualKind::Projectile))
            .field("storms", &self.stats(VisualKind::Storm))
            .finish()
    }
}
