//! Assets: named entities whose lifecycle is transactional.
//!
//! Create, destroy and rename are the only lifecycle transitions, and all
//! three go through a [`Teller`]. The asset instance, and with it its
//! [`AssetId`] and properties, survives renames and is brought back intact
//! when a destroy is undone.

use crate::atom::Atom;
use crate::error::ResError;
use crate::project::{Project, ProjectShared};
use crate::reference::Ref;
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};
use tessera_common::{AssetId, Event};
use tessera_transact::{Property, Teller};
use tracing::debug;

/// A concrete asset type, e.g. a mesh or a level zone.
///
/// Implementors hold their state in [`Property`] fields.
pub trait AssetKind: Any {
    /// Short type name used in diagnostics.
    const KIND: &'static str;

    /// Hand each editable property to `rfl`. Kinds with nothing to expose
    /// keep the empty default.
    fn reflect<R: Reflector>(&self, _rfl: &mut R) {}
}

/// Visitor over an asset kind's properties, for generic property editors.
pub trait Reflector {
    fn field<T: 'static>(&mut self, prop: &Property<T>, label: &'static str);
}

/// What a ref or tracker resolves to: a typed [`Handle`] for an
/// [`AssetKind`], or any asset at all for [`AnyAsset`].
pub trait Kind: 'static {
    type Handle: Clone + 'static;

    fn kind_name() -> &'static str;

    /// `None` if `asset` is not of this kind.
    fn narrow(asset: &Rc<Asset>) -> Option<Self::Handle>;
}

impl<T: AssetKind> Kind for T {
    type Handle = Handle<T>;

    fn kind_name() -> &'static str {
        T::KIND
    }

    fn narrow(asset: &Rc<Asset>) -> Option<Handle<T>> {
        asset.downcast::<T>()
    }
}

/// Matches every asset regardless of its kind.
pub enum AnyAsset {}

impl Kind for AnyAsset {
    type Handle = Rc<Asset>;

    fn kind_name() -> &'static str {
        "asset"
    }

    fn narrow(asset: &Rc<Asset>) -> Option<Rc<Asset>> {
        Some(Rc::clone(asset))
    }
}

pub struct Asset {
    id: AssetId,
    kind: &'static str,
    name: Property<Atom>,
    project: Weak<ProjectShared>,
    body: Rc<dyn Any>,
}

impl Asset {
    /// Create an asset of kind `T` bound to `name`.
    pub fn create<T: AssetKind>(
        ts: &mut Teller,
        project: &Project,
        name: Atom,
        body: T,
    ) -> Result<Handle<T>, ResError> {
        project.check_vacant(&name)?;

        let body = Rc::new(body);
        let asset = Rc::new(Asset {
            id: AssetId::new(),
            kind: T::KIND,
            name: Property::new(Atom::null()),
            project: project.downgrade(),
            body: Rc::clone(&body) as Rc<dyn Any>,
        });

        ts.set(&asset.name, name.clone());
        ts.push_op(project.bind_op(&name, Some(&asset)));
        ts.push(project.asset_list(), Rc::clone(&asset));
        ts.push_op(project.lifecycle_signal(&asset, true));
        debug!(kind = T::KIND, %name, id = %asset.id, "created asset");

        Ok(Handle { asset, body })
    }

    /// Unbind and retire this asset. Undoing the transaction restores the
    /// same instance under the same name.
    pub fn destroy(self: &Rc<Self>, ts: &mut Teller) -> Result<(), ResError> {
        let project = self.project()?;
        let name = self.alive_name()?;
        let index = project.index_of(self).ok_or(ResError::AssetDead)?;

        ts.push_op(project.lifecycle_signal(self, false));
        ts.push_op(project.bind_op(&name, None));
        ts.set(&self.name, Atom::null());
        ts.erase(project.asset_list(), index)?;
        debug!(kind = self.kind, %name, id = %self.id, "destroyed asset");
        Ok(())
    }

    /// Move this asset to `name`, which must be unbound.
    pub fn rename(self: &Rc<Self>, ts: &mut Teller, name: Atom) -> Result<(), ResError> {
        let project = self.project()?;
        let old = self.alive_name()?;
        project.check_vacant(&name)?;

        ts.push_op(project.lifecycle_signal(self, false));
        ts.push_op(project.bind_op(&name, Some(self)));
        ts.push_op(project.bind_op(&old, None));
        ts.set(&self.name, name.clone());
        ts.push_op(project.lifecycle_signal(self, true));
        debug!(kind = self.kind, from = %old, to = %name, "renamed asset");
        Ok(())
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind
    }

    /// Current name; the null atom once the asset is destroyed (or before
    /// its creating transaction ran).
    pub fn get_name(&self) -> Atom {
        self.name.get()
    }

    pub fn is_alive(&self) -> bool {
        !self.name.with(Atom::is_null)
    }

    /// Fires whenever the asset's name changes, including create and destroy.
    pub fn on_name_change(&self) -> &Event<()> {
        self.name.on_change()
    }

    pub fn project(&self) -> Result<Project, ResError> {
        self.project
            .upgrade()
            .map(Project::from_shared)
            .ok_or(ResError::ProjectGone)
    }

    pub fn is<T: AssetKind>(&self) -> bool {
        self.body.is::<T>()
    }

    pub fn downcast<T: AssetKind>(self: &Rc<Self>) -> Option<Handle<T>> {
        let body = Rc::clone(&self.body).downcast::<T>().ok()?;
        Some(Handle {
            asset: Rc::clone(self),
            body,
        })
    }

    fn alive_name(&self) -> Result<Atom, ResError> {
        let name = self.get_name();
        if name.is_null() {
            return Err(ResError::AssetDead);
        }
        Ok(name)
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.get_name())
            .finish()
    }
}

/// Typed view of an asset of kind `T`. Derefs to the asset's body.
pub struct Handle<T> {
    asset: Rc<Asset>,
    body: Rc<T>,
}

impl<T: AssetKind> Handle<T> {
    pub fn asset(&self) -> &Rc<Asset> {
        &self.asset
    }

    pub fn get_name(&self) -> Atom {
        self.asset.get_name()
    }

    /// A ref to this asset's current name. Null if the project is gone.
    pub fn to_ref(&self) -> Ref<T> {
        match self.asset.project() {
            Ok(project) => Ref::new(&project, self.get_name()),
            Err(_) => Ref::null(),
        }
    }

    pub fn destroy(&self, ts: &mut Teller) -> Result<(), ResError> {
        self.asset.destroy(ts)
    }

    pub fn reflect<R: Reflector>(&self, rfl: &mut R) {
        self.body.reflect(rfl);
    }

    pub fn rename(&self, ts: &mut Teller, name: Atom) -> Result<(), ResError> {
        self.asset.rename(ts, name)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            asset: Rc::clone(&self.asset),
            body: Rc::clone(&self.body),
        }
    }
}

impl<T> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.body
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.asset, &other.asset)
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.asset).finish()
    }
}
