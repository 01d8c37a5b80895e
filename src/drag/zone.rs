// Drop zone binding: nesting-aware enter/leave coalescing over a target region.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::event::{files_from_event, DragEvent, DragEventKind, DropEffect};
use crate::engine::request::FileDescriptor;

pub type Listener = Arc<dyn Fn(&mut DragEvent) + Send + Sync>;
pub type DropFn = Arc<dyn Fn(Vec<Arc<FileDescriptor>>) + Send + Sync>;
pub type DragSignalFn = Arc<dyn Fn(&DragEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Anything drag listeners can be attached to.
pub trait DragTarget: Send + Sync {
    fn add_listener(&self, kind: DragEventKind, listener: Listener) -> ListenerId;
    /// Returns `false` if the id was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// In-process drag target. Events bubbling up from the region or any of its
/// descendants are fed in through `dispatch`.
pub struct DropRegion {
    name: String,
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, DragEventKind, Listener)>>,
}

impl DropRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deliver `event` to every listener registered for its kind.
    pub fn dispatch(&self, event: &mut DragEvent) {
        // Snapshot so listeners may detach themselves while running.
        let matching: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind())
            .map(|(_, _, l)| Arc::clone(l))
            .collect();
        for listener in matching {
            listener(&mut *event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl DragTarget for DropRegion {
    fn add_listener(&self, kind: DragEventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, kind, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _, _)| *lid != id);
        listeners.len() != before
    }
}

/// Nesting counter of enter minus leave events. Only the 0→1 and 1→0
/// transitions are reported.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DragDepth(u32);

impl DragDepth {
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns `true` on the 0→1 transition.
    pub fn enter(&mut self) -> bool {
        self.0 += 1;
        self.0 == 1
    }

    /// Returns `true` on the 1→0 transition. A leave at depth 0 is ignored.
    pub fn leave(&mut self) -> bool {
        if self.0 == 0 {
            return false;
        }
        self.0 -= 1;
        self.0 == 0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Optional callbacks of a drag zone.
#[derive(Clone, Default)]
pub struct DragHandlers {
    on_drop: Option<DropFn>,
    on_drag_enter: Option<DragSignalFn>,
    on_drag_leave: Option<DragSignalFn>,
}

impl DragHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_drop(mut self, f: impl Fn(Vec<Arc<FileDescriptor>>) + Send + Sync + 'static) -> Self {
        self.on_drop = Some(Arc::new(f));
        self
    }

    pub fn on_drag_enter(mut self, f: impl Fn(&DragEvent) + Send + Sync + 'static) -> Self {
        self.on_drag_enter = Some(Arc::new(f));
        self
    }

    pub fn on_drag_leave(mut self, f: impl Fn(&DragEvent) + Send + Sync + 'static) -> Self {
        self.on_drag_leave = Some(Arc::new(f));
        self
    }
}

/// A drop zone bound to a target. Dropping the zone (or calling `unbind`)
/// detaches every listener it registered.
pub struct DragZone {
    target: Option<Arc<dyn DragTarget>>,
    ids: Vec<ListenerId>,
    depth: Arc<Mutex<DragDepth>>,
}

impl DragZone {
    pub fn bind(target: Arc<dyn DragTarget>, handlers: DragHandlers) -> Self {
        let depth = Arc::new(Mutex::new(DragDepth::default()));
        let mut ids = Vec::with_capacity(4);

        let enter: Listener = {
            let depth = Arc::clone(&depth);
            let on_enter = handlers.on_drag_enter.clone();
            Arc::new(move |event: &mut DragEvent| {
                event.prevent_default();
                let entered = depth.lock().enter();
                if entered {
                    debug!("drag entered via {:?}", event.origin());
                    if let Some(cb) = &on_enter {
                        cb(event);
                    }
                }
            })
        };
        ids.push(target.add_listener(DragEventKind::Enter, enter));

        let over: Listener = Arc::new(|event: &mut DragEvent| {
            event.prevent_default();
            event.set_drop_effect(DropEffect::Copy);
        });
        ids.push(target.add_listener(DragEventKind::Over, over));

        let leave: Listener = {
            let depth = Arc::clone(&depth);
            let on_leave = handlers.on_drag_leave.clone();
            Arc::new(move |event: &mut DragEvent| {
                let left = depth.lock().leave();
                if left {
                    debug!("drag left via {:?}", event.origin());
                    if let Some(cb) = &on_leave {
                        cb(event);
                    }
                }
            })
        };
        ids.push(target.add_listener(DragEventKind::Leave, leave));

        let dropped: Listener = {
            let depth = Arc::clone(&depth);
            let on_drop = handlers.on_drop.clone();
            let on_leave = handlers.on_drag_leave.clone();
            Arc::new(move |event: &mut DragEvent| {
                event.prevent_default();
                depth.lock().reset();
                let files = files_from_event(event);
                debug!("drop with {} file(s)", files.len());
                if let Some(cb) = &on_drop {
                    cb(files);
                }
                if let Some(cb) = &on_leave {
                    cb(event);
                }
            })
        };
        ids.push(target.add_listener(DragEventKind::Drop, dropped));

        Self {
            target: Some(target),
            ids,
            depth,
        }
    }

    /// A zone bound to nothing; `unbind` is a no-op.
    pub fn detached() -> Self {
        Self {
            target: None,
            ids: Vec::new(),
            depth: Arc::new(Mutex::new(DragDepth::default())),
        }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> u32 {
        self.depth.lock().get()
    }

    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    pub fn unbind(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(target) = self.target.take() {
            for id in self.ids.drain(..) {
                target.remove_listener(id);
            }
        }
    }
}

impl Drop for DragZone {
    fn drop(&mut self) {
        self.detach();
    }
}
