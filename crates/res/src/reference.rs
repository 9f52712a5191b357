use crate::asset::{AnyAsset, Asset, AssetKind, Handle, Kind};
use crate::atom::Atom;
use crate::error::ResError;
use crate::project::{Project, ProjectShared};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Weak;
use tessera_common::ProjectId;
use tessera_transact::Teller;

/// A name in a project, resolved to an asset of kind `K` on demand.
///
/// A ref never owns what it points at. It compares and hashes by
/// `(project, atom)`, so refs to the same name are equal whether or not
/// anything is currently bound there.
pub struct Ref<K: Kind = AnyAsset> {
    project: Weak<ProjectShared>,
    project_id: Option<ProjectId>,
    atom: Atom,
    _kind: PhantomData<fn() -> K>,
}

pub type AnyRef = Ref<AnyAsset>;

impl<K: Kind> Ref<K> {
    pub fn new(project: &Project, atom: Atom) -> Self {
        Self {
            project: project.downgrade(),
            project_id: Some(project.id()),
            atom,
            _kind: PhantomData,
        }
    }

    pub fn null() -> Self {
        Self {
            project: Weak::new(),
            project_id: None,
            atom: Atom::null(),
            _kind: PhantomData,
        }
    }

    pub fn atom(&self) -> &Atom {
        &self.atom
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn project(&self) -> Option<Project> {
        self.project.upgrade().map(Project::from_shared)
    }

    pub fn is_null(&self) -> bool {
        self.atom.is_null()
    }

    /// The asset bound to this name right now, if it is of kind `K`.
    pub fn get(&self) -> Option<K::Handle> {
        let project = self.project.upgrade()?;
        let asset = project.lookup(&self.atom)?;
        K::narrow(&asset)
    }

    pub fn ok(&self) -> bool {
        self.get().is_some()
    }

    /// Like [`Ref::get`], but says why resolution failed.
    pub fn require(&self) -> Result<K::Handle, ResError> {
        if self.atom.is_null() {
            return Err(ResError::NullAtom);
        }
        let project = self.project.upgrade().ok_or(ResError::ProjectGone)?;
        let asset = project
            .lookup(&self.atom)
            .ok_or_else(|| ResError::NotBound(self.atom.clone()))?;
        K::narrow(&asset).ok_or_else(|| mismatch::<K>(&asset))
    }

    /// Reinterpret as a ref of kind `U`. Fails only if something is bound
    /// here now and it is not a `U`.
    pub fn cast<U: Kind>(&self) -> Result<Ref<U>, ResError> {
        if let Some(asset) = self.project.upgrade().and_then(|p| p.lookup(&self.atom)) {
            if U::narrow(&asset).is_none() {
                return Err(mismatch::<U>(&asset));
            }
        }
        Ok(self.retype())
    }

    pub fn untyped(&self) -> AnyRef {
        self.retype()
    }

    fn retype<U: Kind>(&self) -> Ref<U> {
        Ref {
            project: self.project.clone(),
            project_id: self.project_id,
            atom: self.atom.clone(),
            _kind: PhantomData,
        }
    }

    fn key(&self) -> (Option<ProjectId>, &Atom) {
        (self.project_id, &self.atom)
    }
}

impl<T: AssetKind> Ref<T> {
    /// Create a `T` at this ref's name.
    pub fn create(&self, ts: &mut Teller, body: T) -> Result<Handle<T>, ResError> {
        let project = self.project().ok_or(ResError::ProjectGone)?;
        Asset::create(ts, &project, self.atom.clone(), body)
    }
}

fn mismatch<K: Kind>(asset: &Asset) -> ResError {
    ResError::KindMismatch {
        expected: K::kind_name(),
        found: asset.kind_name(),
    }
}

impl<K: Kind> Clone for Ref<K> {
    fn clone(&self) -> Self {
        self.retype()
    }
}

impl<K: Kind> Default for Ref<K> {
    fn default() -> Self {
        Self::null()
    }
}

impl<K: Kind> PartialEq for Ref<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<K: Kind> Eq for Ref<K> {}

impl<K: Kind> PartialOrd for Ref<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Kind> Ord for Ref<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<K: Kind> Hash for Ref<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl<K: Kind> fmt::Debug for Ref<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref<{}>({})", K::kind_name(), self.atom)
    }
}

impl<K: Kind> fmt::Display for Ref<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.atom, f)
    }
}
