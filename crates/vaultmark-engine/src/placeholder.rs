//! Placeholder arena for deferred components.
//!
//! Stage 1 moves diagram sources and track references into the arena and
//! leaves a [`PlaceholderId`] in the tree. Lowering turns the handle into a
//! marker element; stage 2 finds the marker and consumes the arena entry.
//! Only lowering builds elements, so source text can never pose as a marker.

use std::fmt;

use serde::Serialize;

use crate::models::{Element, HNode};
use crate::track::TrackSpec;
use crate::transform::diagrams::DiagramSpec;

/// Tag of the marker element left in the hypertext tree for a placeholder.
pub const MARKER_TAG: &str = "vault-placeholder";
/// Marker attribute holding the arena handle.
pub const HANDLE_ATTR: &str = "data-placeholder";

/// Handle of one arena entry, unique within a compile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlaceholderId(u32);

impl PlaceholderId {
    pub fn index(self) -> u32 {
        self.0
    }

    /// Element written into the hypertext tree in place of the component.
    pub fn marker(self, kind: PlaceholderKind) -> HNode {
        Element::new(MARKER_TAG)
            .with_attr(HANDLE_ATTR, self.0.to_string())
            .with_attr("data-kind", kind.as_str())
            .into()
    }

    /// Handle carried by a marker element, `None` for any other element.
    pub fn from_marker(element: &Element) -> Option<Self> {
        if element.tag != MARKER_TAG {
            return None;
        }
        element.attr(HANDLE_ATTR)?.parse().ok().map(Self)
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderKind {
    TrackMap,
    Diagram,
}

impl PlaceholderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaceholderKind::TrackMap => "trackMap",
            PlaceholderKind::Diagram => "diagram",
        }
    }
}

/// Payload of a placeholder, held until stage 2 substitutes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    Diagram(DiagramSpec),
    TrackMap(TrackSpec),
}

/// Per-compile side table of deferred payloads.
///
/// Every minted handle has exactly one entry until [`PlaceholderArena::take`]
/// consumes it; a consumed handle never resolves again.
#[derive(Debug, Default)]
pub struct PlaceholderArena {
    slots: Vec<Option<Deferred>>,
}

impl PlaceholderArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle the next [`PlaceholderArena::mint`] will return.
    pub fn next_id(&self) -> PlaceholderId {
        PlaceholderId(self.slots.len() as u32)
    }

    /// Stores `deferred` and returns its handle.
    pub fn mint(&mut self, deferred: Deferred) -> PlaceholderId {
        let id = self.next_id();
        self.slots.push(Some(deferred));
        id
    }

    pub fn get(&self, id: PlaceholderId) -> Option<&Deferred> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    /// Removes and returns the payload. Later calls with the same id return `None`.
    pub fn take(&mut self, id: PlaceholderId) -> Option<Deferred> {
        self.slots.get_mut(id.0 as usize)?.take()
    }

    /// Number of entries not yet consumed.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn live(&self) -> impl Iterator<Item = (PlaceholderId, &Deferred)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| Some((PlaceholderId(i as u32), slot.as_ref()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagram(id: &str) -> Deferred {
        Deferred::Diagram(DiagramSpec {
            id: id.into(),
            language: "mermaid".into(),
            source_code: "graph TD".into(),
        })
    }

    #[test]
    fn minted_ids_are_sequential_and_take_consumes() {
        let mut arena = PlaceholderArena::new();
        assert_eq!(arena.next_id().index(), 0);
        let a = arena.mint(diagram("diagram-0"));
        let b = arena.mint(diagram("diagram-1"));
        assert_ne!(a, b);
        assert_eq!(arena.next_id().index(), 2);
        assert_eq!(arena.live_count(), 2);
        assert!(arena.take(a).is_some());
        assert!(arena.take(a).is_none());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.live_count(), 1);
        assert_eq!(arena.live().next().map(|(id, _)| id), Some(b));
    }

    #[test]
    fn marker_carries_handle_and_kind() {
        let mut arena = PlaceholderArena::new();
        arena.mint(diagram("diagram-0"));
        let id = arena.mint(diagram("diagram-1"));

        let marker = id.marker(PlaceholderKind::Diagram);
        let element = marker.as_element().expect("element");
        assert_eq!(element.attr("data-kind"), Some("diagram"));
        assert_eq!(PlaceholderId::from_marker(element), Some(id));
    }

    #[test]
    fn other_elements_are_not_markers() {
        let span = Element::new("span").with_attr(HANDLE_ATTR, "0");
        assert_eq!(PlaceholderId::from_marker(&span), None);
        let garbled = Element::new(MARKER_TAG).with_attr(HANDLE_ATTR, "x");
        assert_eq!(PlaceholderId::from_marker(&garbled), None);
    }
}
