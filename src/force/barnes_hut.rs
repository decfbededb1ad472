use log::{Level, debug, log_enabled, trace};
use nalgebra::Vector3;
use smallvec::{SmallVec, smallvec};

use crate::shared::{Bounds, Float, ForceEvaluator, Particle, SimulationSettings, softened_pull};

/// Depth at which leaves stop splitting. Bodies that still share a leaf there (coincident or
/// nearly coincident positions) are merged into it.
pub const DEFAULT_MAX_DEPTH: usize = 64;

const ROOT: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Empty,
    /// Body indices. Holds a single body except for leaves merged at the depth cap.
    Leaf(SmallVec<[usize; 1]>),
    /// Child node indices, one slot per octant.
    Internal([Option<usize>; 8]),
}

#[derive(Debug, Clone)]
pub struct OctNode<F: Float> {
    bounds: Bounds<F>,
    center_of_mass: Vector3<F>,
    mass: F,
    data: NodeData,
}

impl<F: Float> OctNode<F> {
    fn new(bounds: Bounds<F>) -> Self {
        Self {
            bounds,
            center_of_mass: Vector3::zeros(),
            mass: F::zero(),
            data: NodeData::Empty,
        }
    }

    pub fn bounds(&self) -> &Bounds<F> {
        &self.bounds
    }

    pub fn center_of_mass(&self) -> &Vector3<F> {
        &self.center_of_mass
    }

    pub fn mass(&self) -> F {
        self.mass
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Indices of the children present, in octant order.
    pub fn children(&self) -> impl Iterator<Item = usize> + '_ {
        let slots: &[Option<usize>] = match &self.data {
            NodeData::Internal(children) => children,
            _ => &[],
        };
        slots.iter().flatten().copied()
    }

    fn child(&self, orthant: usize) -> Option<usize> {
        match &self.data {
            NodeData::Internal(children) => children[orthant],
            _ => None,
        }
    }

    fn set_child(&mut self, orthant: usize, child: usize) {
        if let NodeData::Internal(children) = &mut self.data {
            children[orthant] = Some(child);
        }
    }

    /// Whether the node is small enough, seen from `distance`, to stand in for its bodies.
    fn accepts(&self, distance: F, theta: F) -> bool {
        distance > F::zero() && self.bounds.width < theta * distance
    }

    fn incorporate(&mut self, mass: F, position: &Vector3<F>) {
        let total_mass = self.mass + mass;
        self.center_of_mass = (self.center_of_mass * self.mass + position * mass) / total_mass;
        self.mass = total_mass;
    }
}

enum Placement {
    Occupy,
    Merge,
    Split(usize),
    Descend,
}

/// Octree over a set of bodies, stored as an arena of nodes.
///
/// The tree references bodies by index only and keeps no copy of their state, so it is only
/// meaningful for the positions it was built from.
#[derive(Debug, Clone)]
pub struct Octree<F: Float> {
    nodes: Vec<OctNode<F>>,
    max_depth: usize,
}

impl<F: Float> Octree<F> {
    pub fn build<P: Particle<F>>(points: &[P]) -> Self {
        Self::build_with_max_depth(points, DEFAULT_MAX_DEPTH)
    }

    pub fn build_with_max_depth<P: Particle<F>>(points: &[P], max_depth: usize) -> Self {
        let bounds = Bounds::enclosing(points.iter().map(|p| p.position()));
        let mut nodes = Vec::with_capacity(2 * points.len() + 1);
        nodes.push(OctNode::new(bounds));

        let mut tree = Self { nodes, max_depth };
        for body in 0..points.len() {
            tree.insert(ROOT, body, points, 0);
        }
        tree
    }

    pub fn root(&self) -> &OctNode<F> {
        &self.nodes[ROOT]
    }

    pub fn node(&self, index: usize) -> &OctNode<F> {
        &self.nodes[index]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest level holding a node, the root being level 0.
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth).max().unwrap_or(0)
    }

    /// Breadth-first walk yielding `(depth, node)` pairs.
    pub fn iter(&self) -> OctreeIter<'_, F> {
        OctreeIter {
            tree: self,
            current: vec![ROOT],
            next: Vec::new(),
            current_index: 0,
            current_depth: 0,
        }
    }

    fn insert<P: Particle<F>>(&mut self, node: usize, body: usize, points: &[P], depth: usize) {
        let position = *points[body].position();
        let mass = points[body].get_mass();

        let placement = match &self.nodes[node].data {
            NodeData::Empty => Placement::Occupy,
            NodeData::Leaf(_) if depth >= self.max_depth => Placement::Merge,
            NodeData::Leaf(bodies) => Placement::Split(bodies[0]),
            NodeData::Internal(_) => Placement::Descend,
        };

        match placement {
            Placement::Occupy => {
                let leaf = &mut self.nodes[node];
                leaf.data = NodeData::Leaf(smallvec![body]);
                leaf.mass = mass;
                leaf.center_of_mass = position;
                return;
            }
            Placement::Merge => {
                debug!("Merging body {} into a leaf at depth {}", body, depth);
                if let NodeData::Leaf(bodies) = &mut self.nodes[node].data {
                    bodies.push(body);
                }
            }
            Placement::Split(resident) => {
                self.nodes[node].data = NodeData::Internal([None; 8]);
                self.insert_into_orthant(node, resident, points, depth);
                self.insert_into_orthant(node, body, points, depth);
            }
            Placement::Descend => self.insert_into_orthant(node, body, points, depth),
        }

        // The node already accounts for the resident body of a split leaf.
        self.nodes[node].incorporate(mass, &position);
    }

    fn insert_into_orthant<P: Particle<F>>(
        &mut self,
        node: usize,
        body: usize,
        points: &[P],
        depth: usize,
    ) {
        let bounds = self.nodes[node].bounds;
        let orthant = bounds.get_orthant(points[body].position());
        let child = match self.nodes[node].child(orthant) {
            Some(child) => child,
            None => {
                let child = self.nodes.len();
                self.nodes.push(OctNode::new(bounds.create_orthant(orthant)));
                self.nodes[node].set_child(orthant, child);
                child
            }
        };
        self.insert(child, body, points, depth + 1);
    }

    /// Acceleration on body `target` from every other body in the tree.
    ///
    /// A single-body leaf is always a point mass. Any other node is replaced by a point mass at
    /// its center of mass when its width over its distance to the body is below
    /// `settings.theta`; otherwise its children (or the members of a merged leaf) are visited.
    pub fn acceleration<P: Particle<F>>(
        &self,
        target: usize,
        points: &[P],
        settings: &SimulationSettings<F>,
    ) -> Vector3<F> {
        let mut acceleration = Vector3::zeros();
        self.accumulate(ROOT, target, points, settings, &mut acceleration);
        acceleration
    }

    fn accumulate<P: Particle<F>>(
        &self,
        node: usize,
        target: usize,
        points: &[P],
        settings: &SimulationSettings<F>,
        acceleration: &mut Vector3<F>,
    ) {
        let node = &self.nodes[node];
        let position = points[target].position();
        let g_soft2 = settings.softening2();

        match &node.data {
            NodeData::Empty => {}
            NodeData::Leaf(bodies) if bodies.len() == 1 => {
                if bodies[0] != target {
                    *acceleration += softened_pull(
                        node.center_of_mass - position,
                        node.mass,
                        settings.g,
                        g_soft2,
                    );
                }
            }
            NodeData::Leaf(bodies) => {
                let r = node.center_of_mass - position;
                if !bodies.contains(&target) && node.accepts(r.norm(), settings.theta) {
                    *acceleration += softened_pull(r, node.mass, settings.g, g_soft2);
                } else {
                    for &other in bodies.iter().filter(|&&b| b != target) {
                        *acceleration += softened_pull(
                            points[other].position() - position,
                            points[other].get_mass(),
                            settings.g,
                            g_soft2,
                        );
                    }
                }
            }
            NodeData::Internal(children) => {
                let r = node.center_of_mass - position;
                if node.accepts(r.norm(), settings.theta) {
                    *acceleration += softened_pull(r, node.mass, settings.g, g_soft2);
                } else {
                    for &child in children.iter().flatten() {
                        self.accumulate(child, target, points, settings, acceleration);
                    }
                }
            }
        }
    }
}

pub struct OctreeIter<'a, F: Float> {
    tree: &'a Octree<F>,
    current: Vec<usize>,
    next: Vec<usize>,
    current_index: usize,
    current_depth: usize,
}

impl<'a, F: Float> Iterator for OctreeIter<'a, F> {
    type Item = (usize, &'a OctNode<F>);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        if self.current_index < self.current.len() {
            let node = &tree.nodes[self.current[self.current_index]];
            self.next.extend(node.children());
            self.current_index += 1;
            Some((self.current_depth, node))
        } else if self.next.is_empty() {
            None
        } else {
            self.current = std::mem::take(&mut self.next);
            self.current_index = 0;
            self.current_depth += 1;
            self.next()
        }
    }
}

impl<'a, F: Float> IntoIterator for &'a Octree<F> {
    type Item = (usize, &'a OctNode<F>);
    type IntoIter = OctreeIter<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Tree approximation: the octree is rebuilt from the current positions on every evaluation
/// and dropped once all accelerations are known.
#[derive(Debug, Clone, Copy)]
pub struct BarnesHut {
    max_depth: usize,
}

impl Default for BarnesHut {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BarnesHut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl<F: Float, P: Particle<F>> ForceEvaluator<F, P> for BarnesHut {
    fn update_forces(&mut self, points: &mut [P], settings: &SimulationSettings<F>) {
        let accelerations: Vec<Vector3<F>> = {
            let points: &[P] = points;
            let tree = Octree::build_with_max_depth(points, self.max_depth);
            if log_enabled!(Level::Trace) {
                trace!(
                    "Octree built with {} nodes, depth {}",
                    tree.node_count(),
                    tree.depth()
                );
            }
            (0..points.len())
                .map(|i| tree.acceleration(i, points, settings))
                .collect()
        };

        for (point, acceleration) in points.iter_mut().zip(accelerations) {
            *point.acceleration_mut() = acceleration;
        }
    }
}
