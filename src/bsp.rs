//! [BSP](https://en.wikipedia.org/wiki/Binary_space_partitioning) tree node structure and operations.

use crate::plane::Plane;
use crate::polygon::Polygon;
use std::fmt::Debug;
use tracing::trace;

/// A BSP tree node: a splitting plane, the polygons coplanar with it, and
/// optional front/back subtrees.
///
/// The child conventions are load-bearing for clipping: a missing `front`
/// child means the front half-space is empty (outside the solid), while a
/// missing `back` child means the back half-space is solid interior.
///
/// `Clone` is a deep structural copy. The boolean operators rely on that:
/// they clone both operand trees up front and mutate only the clones, so a
/// caller's trees can be shared across concurrent operations.
#[derive(Debug, Clone)]
pub struct Node<S: Clone> {
    /// Splitting plane, or `None` for a node `build` has not yet reached.
    pub plane: Option<Plane>,

    /// Subtree for the *front* half-space.
    pub front: Option<Box<Node<S>>>,

    /// Subtree for the *back* half-space.
    pub back: Option<Box<Node<S>>>,

    /// Polygons lying on `plane` (within tolerance).
    pub polygons: Vec<Polygon<S>>,
}

impl<S: Clone + Send + Sync + Debug> Default for Node<S> {
    fn default() -> Self {
        Self {
            plane: None,
            front: None,
            back: None,
            polygons: Vec::new(),
        }
    }
}

impl<S: Clone + Send + Sync + Debug> Node<S> {
    /// Build a BSP tree from a polygon list.
    pub fn new(polygons: &[Polygon<S>]) -> Self {
        let mut node = Self::default();
        if !polygons.is_empty() {
            node.build(polygons);
        }
        node
    }

    /// Convert solid space to empty space and empty space to solid space,
    /// in place. Applying it twice restores the original tree.
    pub fn invert(&mut self) {
        for p in &mut self.polygons {
            p.flip();
        }
        if let Some(plane) = self.plane.as_mut() {
            plane.flip();
        }
        if let Some(front) = self.front.as_mut() {
            front.invert();
        }
        if let Some(back) = self.back.as_mut() {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Return the fragments of `polygons` that lie outside the solid this
    /// tree represents.
    ///
    /// Coplanar pieces merge into the front/back routing rather than a
    /// separate bucket. A missing front child keeps its list (empty
    /// exterior); a missing back child discards its list (solid interior).
    pub fn clip_polygons(&self, polygons: &[Polygon<S>]) -> Vec<Polygon<S>> {
        let Some(plane) = self.plane.as_ref() else {
            return polygons.to_vec();
        };
        if !plane.is_valid() {
            return polygons.to_vec();
        }

        let mut list_front = Vec::new();
        let mut list_back = Vec::new();
        for polygon in polygons {
            let (mut cf, mut cb, mut f, mut b) = plane.split_polygon(polygon);
            list_front.append(&mut cf);
            list_front.append(&mut f);
            list_back.append(&mut cb);
            list_back.append(&mut b);
        }

        let mut list_front = match self.front.as_ref() {
            Some(front) => front.clip_polygons(&list_front),
            None => list_front,
        };
        let list_back = match self.back.as_ref() {
            Some(back) => back.clip_polygons(&list_back),
            None => Vec::new(),
        };

        list_front.extend(list_back);
        list_front
    }

    /// Remove from this tree every polygon fragment inside the solid
    /// represented by `other`: each node's polygons are clipped against the
    /// whole other tree, recursively.
    pub fn clip_to(&mut self, other: &Node<S>) {
        self.polygons = other.clip_polygons(&self.polygons);
        if let Some(front) = self.front.as_mut() {
            front.clip_to(other);
        }
        if let Some(back) = self.back.as_mut() {
            back.clip_to(other);
        }
    }

    /// All polygons in this tree: this node's, then the front subtree's,
    /// then the back subtree's.
    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        let mut list = self.polygons.clone();
        if let Some(front) = self.front.as_ref() {
            list.extend(front.all_polygons());
        }
        if let Some(back) = self.back.as_ref() {
            list.extend(back.all_polygons());
        }
        list
    }

    /// Partition `polygons` into the tree rooted at `self`. Calling it on an
    /// existing tree filters the new polygons down to the leaves.
    ///
    /// A fresh node adopts the **first** polygon's supporting plane as its
    /// splitting plane. No heuristic is applied, so tree shape follows input
    /// order exactly; tests that depend on tree layout must fix their input
    /// order.
    pub fn build(&mut self, polygons: &[Polygon<S>]) {
        if polygons.is_empty() {
            return;
        }

        let fresh = !self.plane.as_ref().is_some_and(Plane::is_valid);
        if fresh {
            self.plane = Some(polygons[0].plane.clone());
        }
        let plane = self
            .plane
            .clone()
            .unwrap_or_else(|| polygons[0].plane.clone());

        if !plane.is_valid() {
            // Degenerate splitter: nothing can be classified here.
            self.polygons.extend_from_slice(polygons);
            return;
        }

        let mut list_front = Vec::new();
        let mut list_back = Vec::new();
        let coplanar_before = self.polygons.len();
        for polygon in polygons {
            let (mut cf, mut cb, mut f, mut b) = plane.split_polygon(polygon);
            self.polygons.append(&mut cf);
            self.polygons.append(&mut cb);
            list_front.append(&mut f);
            list_back.append(&mut b);
        }
        let no_coplanar = self.polygons.len() == coplanar_before;

        trace!(
            input = polygons.len(),
            coplanar = self.polygons.len() - coplanar_before,
            front = list_front.len(),
            back = list_back.len(),
            "built BSP node"
        );

        // On a fresh node the splitter came from the input itself, so a
        // split that hands the entire input back unsplit on one side has
        // made no progress and would recurse forever. Absorb such a list
        // instead of recursing.
        let stalled = |side: &Vec<Polygon<S>>, other: &Vec<Polygon<S>>| {
            fresh && no_coplanar && other.is_empty() && side.len() == polygons.len()
        };

        if !list_front.is_empty() {
            if stalled(&list_front, &list_back) {
                self.polygons.append(&mut list_front);
            } else {
                self.front
                    .get_or_insert_with(|| Box::new(Node::default()))
                    .build(&list_front);
            }
        }

        if !list_back.is_empty() {
            if stalled(&list_back, &list_front) {
                self.polygons.append(&mut list_back);
            } else {
                self.back
                    .get_or_insert_with(|| Box::new(Node::default()))
                    .build(&list_back);
            }
        }
    }
}
