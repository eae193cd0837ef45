// SPDX-License-Identifier: AGPL-3.0-or-later
// SochDB - LLM-Optimized Embedded Database
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Capability tokens for selections

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Selection;
use crate::error::{Result, VfdError};

/// Capability token naming a registered selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceId(pub u64);

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "space#{}", self.0)
    }
}

/// Registry shared between the dispatch layer and drivers
pub type SharedRegistry = Arc<RwLock<SpaceRegistry>>;

/// Maps capability tokens to selection objects
#[derive(Debug, Default)]
pub struct SpaceRegistry {
    spaces: HashMap<SpaceId, Arc<dyn Selection>>,
    next_id: u64,
}

impl SpaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn register(&mut self, space: Arc<dyn Selection>) -> SpaceId {
        self.next_id += 1;
        let id = SpaceId(self.next_id);
        self.spaces.insert(id, space);
        id
    }

    pub fn resolve(&self, id: SpaceId) -> Result<Arc<dyn Selection>> {
        self.spaces.get(&id).cloned().ok_or_else(|| {
            tracing::debug!(%id, "unresolvable selection token");
            VfdError::Handle(format!("{} is not a registered selection", id))
        })
    }

    /// Drop a token; the selection itself lives on with its other owners
    pub fn remove(&mut self, id: SpaceId) -> Option<Arc<dyn Selection>> {
        self.spaces.remove(&id)
    }

    pub fn contains(&self, id: SpaceId) -> bool {
        self.spaces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}

/// A selection given either directly or by token
#[derive(Debug, Clone)]
pub enum SpaceRef {
    Direct(Arc<dyn Selection>),
    Token(SpaceId),
}

impl SpaceRef {
    pub fn direct(space: impl Selection + 'static) -> Self {
        SpaceRef::Direct(Arc::new(space))
    }

    pub fn resolve(&self, registry: &SpaceRegistry) -> Result<Arc<dyn Selection>> {
        match self {
            SpaceRef::Direct(space) => Ok(Arc::clone(space)),
            SpaceRef::Token(id) => registry.resolve(*id),
        }
    }

    pub fn token(&self) -> Option<SpaceId> {
        match self {
            SpaceRef::Direct(_) => None,
            SpaceRef::Token(id) => Some(*id),
        }
    }
}

impl From<SpaceId> for SpaceRef {
    fn from(id: SpaceId) -> Self {
        SpaceRef::Token(id)
    }
}

impl From<Arc<dyn Selection>> for SpaceRef {
    fn from(space: Arc<dyn Selection>) -> Self {
        SpaceRef::Direct(space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::selection::RunSelection;

    #[test]
    fn test_register_resolve_remove() {
        let mut registry = SpaceRegistry::new();
        let id = registry.register(Arc::new(RunSelection::all(10)));
        assert!(registry.contains(id));
        assert_eq!(registry.resolve(id).unwrap().element_count(), 10);

        assert!(registry.remove(id).is_some());
        assert!(registry.is_empty());
        let err = registry.resolve(id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Handle);
    }

    #[test]
    fn test_space_ref_resolution() {
        let mut registry = SpaceRegistry::new();
        let id = registry.register(Arc::new(RunSelection::all(3)));

        let by_token = SpaceRef::from(id);
        let direct = SpaceRef::direct(RunSelection::all(7));
        assert_eq!(by_token.resolve(&registry).unwrap().element_count(), 3);
        assert_eq!(direct.resolve(&registry).unwrap().element_count(), 7);
        assert_eq!(by_token.token(), Some(id));
        assert_eq!(direct.token(), None);

        let dangling = SpaceRef::Token(SpaceId(999));
        assert!(dangling.resolve(&registry).is_err());
    }
}
