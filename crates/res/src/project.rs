//! The project: one namespace of assets plus the nexus that records every
//! change made to it.

use crate::asset::{Asset, AssetKind, Handle, Kind};
use crate::atom::Atom;
use crate::error::ResError;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};
use tessera_common::{Event, ProjectId};
use tessera_transact::{Exchange, Nexus, Operation, Property, Teller, TransactError};
use tracing::trace;

pub(crate) struct ProjectShared {
    id: ProjectId,
    nexus: Nexus,
    assets: Property<Vec<Rc<Asset>>>,
    bindings: RefCell<BTreeMap<Atom, Weak<Asset>>>,
    on_asset_appear: Event<Rc<Asset>>,
    on_asset_disappear: Event<Rc<Asset>>,
}

impl ProjectShared {
    pub(crate) fn lookup(&self, name: &Atom) -> Option<Rc<Asset>> {
        self.bindings.borrow().get(name).and_then(Weak::upgrade)
    }

    /// Live assets whose name is `base` or lies under it.
    pub(crate) fn assets_under(&self, base: &Atom) -> Vec<Rc<Asset>> {
        self.bindings
            .borrow()
            .iter()
            .filter(|(name, _)| base.contains(name))
            .filter_map(|(_, asset)| asset.upgrade())
            .collect()
    }
}

/// Cheap handle to a project. Clones share the same namespace.
#[derive(Clone)]
pub struct Project {
    shared: Rc<ProjectShared>,
}

impl Project {
    pub fn new() -> Self {
        let id = ProjectId::new();
        trace!(id = %id.0, "new project");
        Self {
            shared: Rc::new(ProjectShared {
                id,
                nexus: Nexus::new(),
                assets: Property::new(Vec::new()),
                bindings: RefCell::new(BTreeMap::new()),
                on_asset_appear: Event::new(),
                on_asset_disappear: Event::new(),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Rc<ProjectShared>) -> Self {
        Self { shared }
    }

    pub(crate) fn downgrade(&self) -> Weak<ProjectShared> {
        Rc::downgrade(&self.shared)
    }

    pub fn id(&self) -> ProjectId {
        self.shared.id
    }

    pub fn nexus(&self) -> &Nexus {
        &self.shared.nexus
    }

    /// Shorthand for [`Nexus::run`] on this project's nexus.
    pub fn run<R, E>(&self, job: impl FnOnce(&mut Teller) -> Result<R, E>) -> Result<R, E>
    where
        E: From<TransactError>,
    {
        self.shared.nexus.run(job)
    }

    pub fn undo(&self) -> Result<(), TransactError> {
        self.shared.nexus.undo()
    }

    pub fn redo(&self) -> Result<(), TransactError> {
        self.shared.nexus.redo()
    }

    pub fn root(&self) -> Atom {
        Atom::root()
    }

    pub fn create<T: AssetKind>(
        &self,
        ts: &mut Teller,
        name: Atom,
        body: T,
    ) -> Result<Handle<T>, ResError> {
        Asset::create(ts, self, name, body)
    }

    /// The asset bound to `name`, if any.
    pub fn lookup(&self, name: &Atom) -> Option<Rc<Asset>> {
        self.shared.lookup(name)
    }

    /// The asset bound to `name`, narrowed to kind `K`.
    pub fn get<K: Kind>(&self, name: &Atom) -> Option<K::Handle> {
        self.lookup(name).and_then(|asset| K::narrow(&asset))
    }

    /// Every bound name, in atom order.
    pub fn get_asset_names(&self) -> Vec<Atom> {
        self.shared.bindings.borrow().keys().cloned().collect()
    }

    /// Bound names strictly below `base`, at any depth.
    pub fn get_asset_names_under(&self, base: &Atom) -> Vec<Atom> {
        self.shared
            .bindings
            .borrow()
            .keys()
            .filter(|name| base.is_ancestor_of(name))
            .cloned()
            .collect()
    }

    /// Immediate children of `base` that are bound or have bound
    /// descendants.
    pub fn children_of(&self, base: &Atom) -> Vec<Atom> {
        let depth = base.depth();
        let children: BTreeSet<Atom> = self
            .get_asset_names_under(base)
            .iter()
            .filter_map(|name| name.components().get(depth).cloned())
            .filter_map(|component| base.child(&component).ok())
            .collect();
        children.into_iter().collect()
    }

    /// Live assets in creation order.
    pub fn get_asset_list(&self) -> Vec<Rc<Asset>> {
        self.shared.assets.get()
    }

    pub fn asset_count(&self) -> usize {
        self.shared.assets.len()
    }

    /// Fires when an asset becomes bound: creation, the arrival side of a
    /// rename, and undo of a destroy.
    pub fn on_asset_appear(&self) -> &Event<Rc<Asset>> {
        &self.shared.on_asset_appear
    }

    /// Fires when an asset stops being bound.
    pub fn on_asset_disappear(&self) -> &Event<Rc<Asset>> {
        &self.shared.on_asset_disappear
    }

    pub(crate) fn check_vacant(&self, name: &Atom) -> Result<(), ResError> {
        if name.is_null() {
            return Err(ResError::NullAtom);
        }
        if name.is_root() {
            return Err(ResError::InvalidName(String::new()));
        }
        if self.shared.bindings.borrow().contains_key(name) {
            return Err(ResError::NameTaken(name.clone()));
        }
        Ok(())
    }

    pub(crate) fn asset_list(&self) -> &Property<Vec<Rc<Asset>>> {
        &self.shared.assets
    }

    pub(crate) fn index_of(&self, asset: &Rc<Asset>) -> Option<usize> {
        self.shared
            .assets
            .with(|list| list.iter().position(|a| Rc::ptr_eq(a, asset)))
    }

    /// Bind `name` to `asset`, or unbind it when `asset` is `None`.
    pub(crate) fn bind_op(&self, name: &Atom, asset: Option<&Rc<Asset>>) -> Operation {
        Operation::Assign(Box::new(BindOp {
            project: self.downgrade(),
            name: name.clone(),
            staged: asset.map(Rc::downgrade),
        }))
    }

    /// Announce `asset` as appearing (`raised`) or disappearing. Executing
    /// the operation again announces the opposite.
    pub(crate) fn lifecycle_signal(&self, asset: &Rc<Asset>, raised: bool) -> Operation {
        let project = self.downgrade();
        let asset = Rc::clone(asset);
        Operation::signal(raised, move |appear| {
            let Some(project) = project.upgrade() else {
                return;
            };
            if appear {
                trace!(id = %asset.id(), "asset appears");
                project.on_asset_appear.emit(&asset);
            } else {
                trace!(id = %asset.id(), "asset disappears");
                project.on_asset_disappear.emit(&asset);
            }
        })
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.shared.id == other.shared.id
    }
}

impl Eq for Project {}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("id", &self.shared.id)
            .field("assets", &self.asset_count())
            .field("nexus", &self.shared.nexus)
            .finish()
    }
}

/// Toggles one entry of the binding map.
struct BindOp {
    project: Weak<ProjectShared>,
    name: Atom,
    staged: Option<Weak<Asset>>,
}

impl Exchange for BindOp {
    fn exchange(&mut self) {
        let Some(project) = self.project.upgrade() else {
            return;
        };
        let mut bindings = project.bindings.borrow_mut();
        self.staged = match self.staged.take() {
            Some(asset) => bindings.insert(self.name.clone(), asset),
            None => bindings.remove(&self.name),
        };
    }
}
