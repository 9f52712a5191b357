//! Observers that follow names rather than instances.
//!
//! A [`Tracker`] watches one atom and reports whichever asset of its kind is
//! bound there, through every create, destroy, rename, undo and redo. A
//! [`PropTracker`] gets its atom from a `Property<Ref<K>>` and re-targets when
//! the property changes. A [`TreeTracker`] follows every asset under a base
//! atom.
//!
//! Trackers subscribe to the project's appear/disappear events with weak
//! captures, so dropping a tracker detaches it. They never hold a `RefCell`
//! borrow while emitting, so handlers may freely query the tracker.

use crate::asset::{Asset, Kind};
use crate::atom::Atom;
use crate::project::{Project, ProjectShared};
use crate::reference::Ref;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tessera_common::{AssetId, Event, Subscription};
use tessera_transact::Property;
use tracing::trace;

struct Acquired<K: Kind> {
    asset: Rc<Asset>,
    handle: K::Handle,
}

struct TrackerState<K: Kind> {
    project: Weak<ProjectShared>,
    name: RefCell<Atom>,
    current: RefCell<Option<Acquired<K>>>,
    on_acquire: Event<K::Handle>,
    on_lose: Event<()>,
}

impl<K: Kind> TrackerState<K> {
    fn appeared(&self, asset: &Rc<Asset>) {
        if self.current.borrow().is_some() {
            return;
        }
        let name = self.name.borrow().clone();
        if name.is_null() || asset.get_name() != name {
            return;
        }
        let Some(handle) = K::narrow(asset) else {
            return;
        };
        trace!(%name, "tracker acquired");
        *self.current.borrow_mut() = Some(Acquired {
            asset: Rc::clone(asset),
            handle: handle.clone(),
        });
        self.on_acquire.emit(&handle);
    }

    fn disappeared(&self, asset: &Rc<Asset>) {
        let lost = {
            let mut current = self.current.borrow_mut();
            let held = current
                .as_ref()
                .is_some_and(|acquired| Rc::ptr_eq(&acquired.asset, asset));
            if held { current.take() } else { None }
        };
        if lost.is_some() {
            trace!(name = %self.name.borrow(), "tracker lost");
            self.on_lose.emit(&());
        }
    }

    fn retarget(&self, name: Atom) {
        if *self.name.borrow() == name && self.current.borrow().is_some() {
            return;
        }
        let lost = self.current.borrow_mut().take();
        if lost.is_some() {
            self.on_lose.emit(&());
        }
        *self.name.borrow_mut() = name.clone();
        let Some(project) = self.project.upgrade() else {
            return;
        };
        if let Some(asset) = project.lookup(&name) {
            self.appeared(&asset);
        }
    }
}

/// Follows the asset of kind `K` bound to one atom.
///
/// Subscribe to [`Tracker::on_acquire`] before calling
/// [`Tracker::set_name`] to see the initial acquisition.
pub struct Tracker<K: Kind> {
    state: Rc<TrackerState<K>>,
    _appear: Subscription,
    _disappear: Subscription,
}

impl<K: Kind> Tracker<K> {
    pub fn new(project: &Project) -> Self {
        let state = Rc::new(TrackerState {
            project: project.downgrade(),
            name: RefCell::new(Atom::null()),
            current: RefCell::new(None),
            on_acquire: Event::new(),
            on_lose: Event::new(),
        });
        let appear = {
            let state = Rc::downgrade(&state);
            project.on_asset_appear().subscribe(move |asset| {
                if let Some(state) = state.upgrade() {
                    state.appeared(asset);
                }
            })
        };
        let disappear = {
            let state = Rc::downgrade(&state);
            project.on_asset_disappear().subscribe(move |asset| {
                if let Some(state) = state.upgrade() {
                    state.disappeared(asset);
                }
            })
        };
        Self {
            state,
            _appear: appear,
            _disappear: disappear,
        }
    }

    pub fn get_name(&self) -> Atom {
        self.state.name.borrow().clone()
    }

    /// Track `name` instead. Fires `on_lose` for the asset held so far, then
    /// `on_acquire` if something of kind `K` is already bound at `name`.
    pub fn set_name(&self, name: Atom) {
        self.state.retarget(name);
    }

    pub fn get(&self) -> Option<K::Handle> {
        self.state
            .current
            .borrow()
            .as_ref()
            .map(|acquired| acquired.handle.clone())
    }

    pub fn on_acquire(&self) -> &Event<K::Handle> {
        &self.state.on_acquire
    }

    pub fn on_lose(&self) -> &Event<()> {
        &self.state.on_lose
    }
}

/// A [`Tracker`] whose target is the value of a `Property<Ref<K>>`.
pub struct PropTracker<K: Kind> {
    tracker: Tracker<K>,
    watch: RefCell<Option<Subscription>>,
}

impl<K: Kind> PropTracker<K> {
    pub fn new(project: &Project) -> Self {
        Self {
            tracker: Tracker::new(project),
            watch: RefCell::new(None),
        }
    }

    /// Follow `prop`. Replaces any previous binding.
    pub fn bind(&self, prop: &Property<Ref<K>>) {
        let state = Rc::downgrade(&self.tracker.state);
        let view = prop.view();
        let watch = prop.on_change().subscribe(move |_| {
            if let (Some(state), Some(target)) = (state.upgrade(), view.get()) {
                state.retarget(target.atom().clone());
            }
        });
        *self.watch.borrow_mut() = Some(watch);
        self.tracker.set_name(prop.with(|r| r.atom().clone()));
    }

    /// Stop following the property and release the current asset.
    pub fn unbind(&self) {
        drop(self.watch.borrow_mut().take());
        self.tracker.set_name(Atom::null());
    }

    pub fn is_bound(&self) -> bool {
        self.watch.borrow().is_some()
    }

    pub fn get_name(&self) -> Atom {
        self.tracker.get_name()
    }

    pub fn get(&self) -> Option<K::Handle> {
        self.tracker.get()
    }

    pub fn on_acquire(&self) -> &Event<K::Handle> {
        self.tracker.on_acquire()
    }

    pub fn on_lose(&self) -> &Event<()> {
        self.tracker.on_lose()
    }
}

struct TreeState<K: Kind> {
    project: Weak<ProjectShared>,
    base: RefCell<Atom>,
    acquired: RefCell<BTreeMap<AssetId, K::Handle>>,
    on_acquire: Event<K::Handle>,
    on_lose: Event<K::Handle>,
}

impl<K: Kind> TreeState<K> {
    fn appeared(&self, asset: &Rc<Asset>) {
        if !self.base.borrow().contains(&asset.get_name()) {
            return;
        }
        if self.acquired.borrow().contains_key(&asset.id()) {
            return;
        }
        let Some(handle) = K::narrow(asset) else {
            return;
        };
        self.acquired
            .borrow_mut()
            .insert(asset.id(), handle.clone());
        self.on_acquire.emit(&handle);
    }

    fn disappeared(&self, asset: &Rc<Asset>) {
        let lost = self.acquired.borrow_mut().remove(&asset.id());
        if let Some(handle) = lost {
            self.on_lose.emit(&handle);
        }
    }

    fn rebase(&self, base: Atom) {
        if *self.base.borrow() == base {
            return;
        }
        let lost: Vec<K::Handle> = std::mem::take(&mut *self.acquired.borrow_mut())
            .into_values()
            .collect();
        for handle in &lost {
            self.on_lose.emit(handle);
        }
        *self.base.borrow_mut() = base.clone();
        let Some(project) = self.project.upgrade() else {
            return;
        };
        for asset in project.assets_under(&base) {
            self.appeared(&asset);
        }
    }
}

/// Follows every asset of kind `K` named by the base atom or anything
/// below it.
pub struct TreeTracker<K: Kind> {
    state: Rc<TreeState<K>>,
    _appear: Subscription,
    _disappear: Subscription,
}

impl<K: Kind> TreeTracker<K> {
    pub fn new(project: &Project) -> Self {
        let state = Rc::new(TreeState {
            project: project.downgrade(),
            base: RefCell::new(Atom::null()),
            acquired: RefCell::new(BTreeMap::new()),
            on_acquire: Event::new(),
            on_lose: Event::new(),
        });
        let appear = {
            let state = Rc::downgrade(&state);
            project.on_asset_appear().subscribe(move |asset| {
                if let Some(state) = state.upgrade() {
                    state.appeared(asset);
                }
            })
        };
        let disappear = {
            let state = Rc::downgrade(&state);
            project.on_asset_disappear().subscribe(move |asset| {
                if let Some(state) = state.upgrade() {
                    state.disappeared(asset);
                }
            })
        };
        Self {
            state,
            _appear: appear,
            _disappear: disappear,
        }
    }

    pub fn get_base(&self) -> Atom {
        self.state.base.borrow().clone()
    }

    /// Track the subtree at `base`. Everything held so far is lost first.
    /// Does nothing if `base` is already the base.
    pub fn set_base(&self, base: Atom) {
        self.state.rebase(base);
    }

    /// Currently tracked assets, in `AssetId` order.
    pub fn get(&self) -> Vec<K::Handle> {
        self.state.acquired.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.acquired.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn on_acquire(&self) -> &Event<K::Handle> {
        &self.state.on_acquire
    }

    pub fn on_lose(&self) -> &Event<K::Handle> {
        &self.state.on_lose
    }
}
