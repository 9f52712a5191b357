//! Hierarchical names.
//!
//! An [`Atom`] is a path of name components such as `/levels/l01/zone`.
//! Atoms are plain values: they are compared, ordered and hashed by their
//! components, and an atom names a *potential* binding whether or not any
//! asset currently holds it.

use crate::error::ResError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

const NULL_TEXT: &str = "[null]";

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Atom {
    path: Option<Arc<[String]>>,
}

impl Atom {
    /// The null atom. Names nothing; every navigation from it fails.
    pub fn null() -> Self {
        Self { path: None }
    }

    /// The root of the namespace. Has no components and never binds an asset.
    pub fn root() -> Self {
        Self {
            path: Some(Arc::from(Vec::<String>::new())),
        }
    }

    /// Parse `/a/b/c`. Both `""` and `"/"` are the root, and the text
    /// produced for the null atom parses back to it.
    pub fn parse(text: &str) -> Result<Self, ResError> {
        if text == NULL_TEXT {
            return Ok(Self::null());
        }
        if text.is_empty() || text == "/" {
            return Ok(Self::root());
        }
        let rest = text
            .strip_prefix('/')
            .ok_or_else(|| ResError::InvalidName(text.to_owned()))?;
        let mut atom = Self::root();
        for component in rest.split('/') {
            atom = atom.child(component)?;
        }
        Ok(atom)
    }

    pub fn is_null(&self) -> bool {
        self.path.is_none()
    }

    pub fn is_root(&self) -> bool {
        matches!(&self.path, Some(p) if p.is_empty())
    }

    /// Name components, outermost first. Empty for the root and the null atom.
    pub fn components(&self) -> &[String] {
        self.path.as_deref().unwrap_or(&[])
    }

    pub fn depth(&self) -> usize {
        self.components().len()
    }

    pub fn child(&self, name: &str) -> Result<Self, ResError> {
        let path = self.path.as_deref().ok_or(ResError::NullAtom)?;
        if name.is_empty() || name.contains('/') {
            return Err(ResError::InvalidName(name.to_owned()));
        }
        let mut components = path.to_vec();
        components.push(name.to_owned());
        Ok(Self {
            path: Some(Arc::from(components)),
        })
    }

    /// The enclosing atom. `None` for the root and the null atom.
    pub fn parent(&self) -> Option<Self> {
        let path = self.path.as_deref()?;
        let (_, outer) = path.split_last()?;
        Some(Self {
            path: Some(Arc::from(outer.to_vec())),
        })
    }

    /// Last component; `""` for the root.
    pub fn name(&self) -> &str {
        match self.path.as_deref() {
            None => NULL_TEXT,
            Some(path) => path.last().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn full_path(&self) -> String {
        match self.path.as_deref() {
            None => NULL_TEXT.to_owned(),
            Some(path) => path.iter().map(|c| format!("/{c}")).collect(),
        }
    }

    /// True if `other` lies strictly below `self`.
    pub fn is_ancestor_of(&self, other: &Atom) -> bool {
        match (self.path.as_deref(), other.path.as_deref()) {
            (Some(outer), Some(inner)) => inner.len() > outer.len() && inner.starts_with(outer),
            _ => false,
        }
    }

    /// True if `other` is `self` or lies below it.
    pub fn contains(&self, other: &Atom) -> bool {
        !self.is_null() && (self == other || self.is_ancestor_of(other))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self.full_path())
    }
}

impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full_path())
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Atom::parse(&text).map_err(serde::de::Error::custom)
    }
}
