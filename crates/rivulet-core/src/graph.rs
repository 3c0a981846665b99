//! Node arena, pull protocol, and cycle-safe traversal.
//!
//! [`SignalGraph`] owns every node in a slot addressed by [`NodeId`]. Nodes
//! refer to their sources by id, so feedback topologies are just ids that
//! lead back around; nothing is reference counted.
//!
//! # Pull Protocol
//!
//! [`SignalGraph::sample`] asks a node for `count` samples and gets back one
//! of three answers:
//!
//! - `Some(buf)` with `buf.len() == count`: a full block.
//! - `Some(buf)` with `0 < buf.len() < count`: a short block; the end is near.
//! - `None`: exhausted. Every later call also returns `None`.
//!
//! The graph enforces this for every node: a zero-length block is treated as
//! `None`, an exhausted node is never called again, and an over-long block is
//! truncated to `count`.
//!
//! # Sharing
//!
//! A [`NodeHandle`] is the move-only right to pull from one node. Building a
//! downstream node consumes the handles of its inputs, so a plain node can only
//! ever have one puller. The one way to fan a node out is
//! [`SignalGraph::tee`](crate::SignalGraph::tee), which hands out one branch
//! handle per consumer.
//!
//! # Feedback
//!
//! [`SignalGraph::reserve`] hands out a handle to a slot before its node
//! exists, so a node can (transitively) take itself as a source. Pulling
//! around such a loop within one block is a [`Error::ReentrantPull`]; a loop
//! needs a buffering node that can answer from stored samples.
//!
//! ```rust
//! use rivulet_core::{BufferSource, Mixer, SampleBuffer, SignalGraph};
//!
//! let mut graph = SignalGraph::new();
//! let a = graph.add(BufferSource::new(SampleBuffer::from(vec![1.0f32; 4])));
//! let b = graph.add(BufferSource::new(SampleBuffer::from(vec![2.0f32; 4])));
//! let mix = graph.add(Mixer::new().with_input(a, 1.0f32).with_input(b, 0.5f32));
//!
//! let out = graph.sample(&mix, 4).unwrap().unwrap();
//! assert_eq!(out.as_f32().unwrap(), &[2.0; 4]);
//! assert_eq!(graph.graph(mix.id()).unwrap().len(), 3);
//! assert!(graph.sample(&mix, 4).unwrap().is_none());
//! ```

use std::any::Any;
use std::collections::HashSet;

use crate::error::{Error, Result, check_sample_rate};
use crate::sample::SampleBuffer;
use crate::settings::GraphSettings;

/// Index of a node within a [`SignalGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Slot index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// The exclusive right to pull samples from one node.
///
/// Not `Clone`: see [`SignalGraph::tee`](crate::SignalGraph::tee) for sharing.
#[derive(Debug, PartialEq, Eq)]
pub struct NodeHandle {
    id: NodeId,
}

impl NodeHandle {
    /// Id of the node this handle pulls from.
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// A reserved, not yet filled node slot. Consumed by [`SignalGraph::fill`].
#[derive(Debug)]
#[must_use = "a reserved slot stays empty until it is filled"]
pub struct Reservation {
    id: NodeId,
}

impl Reservation {
    /// Id of the reserved slot.
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// A sample-producing node.
///
/// Implementations pull their inputs through the [`PullContext`] and return a
/// block according to the pull protocol (see the [module docs](self)).
pub trait Node {
    /// Produces up to `count` samples.
    fn sample(&mut self, ctx: &mut PullContext<'_>, count: usize) -> Result<Option<SampleBuffer>>;

    /// Ids of the nodes this node pulls from.
    fn sources(&self) -> Vec<NodeId>;

    /// Short type name used in logs and introspection.
    fn name(&self) -> &'static str;

    /// Whether a sample rate set on this node should also be set on its
    /// sources. Rate converters return `false`.
    fn propagates_sample_rate(&self) -> bool {
        true
    }

    /// Sample rate this node runs at when added behind a source running at
    /// `source_rate`.
    fn output_rate(&self, source_rate: f64) -> f64 {
        source_rate
    }
}

/// Access to the graph from inside [`Node::sample`].
pub struct PullContext<'g> {
    graph: &'g mut SignalGraph,
    node: NodeId,
}

impl PullContext<'_> {
    /// Id of the node being sampled.
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Pulls `count` samples from an input.
    pub fn pull(&mut self, input: &NodeHandle, count: usize) -> Result<Option<SampleBuffer>> {
        self.graph.sample(input, count)
    }

    /// Sample rate of the node being sampled.
    pub fn sample_rate(&self) -> f64 {
        self.graph.slots[self.node.index()].sample_rate
    }

    /// Sample rate of an input.
    pub fn source_rate(&self, input: &NodeHandle) -> Result<f64> {
        self.graph.sample_rate(input.id)
    }

    /// Construction defaults of the graph.
    pub fn settings(&self) -> &GraphSettings {
        &self.graph.settings
    }
}

/// A boxed node that can be recovered as its concrete type.
trait DynNode: Node {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<N: Node + 'static> DynNode for N {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Slot {
    node: Option<Box<dyn DynNode>>,
    name: &'static str,
    sources: Vec<NodeId>,
    propagates: bool,
    sample_rate: f64,
    filled: bool,
    exhausted: bool,
}

impl Slot {
    fn empty(sample_rate: f64) -> Self {
        Self {
            node: None,
            name: "reserved",
            sources: Vec::new(),
            propagates: true,
            sample_rate,
            filled: false,
            exhausted: false,
        }
    }
}

/// Arena of nodes plus the pull driver.
pub struct SignalGraph {
    slots: Vec<Slot>,
    settings: GraphSettings,
}

impl Default for SignalGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SignalGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalGraph")
            .field("nodes", &self.slots.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl SignalGraph {
    /// Creates an empty graph with default settings.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            settings: GraphSettings::default(),
        }
    }

    /// Creates an empty graph with the given construction defaults.
    pub fn with_settings(settings: GraphSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            slots: Vec::new(),
            settings,
        })
    }

    /// Construction defaults.
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Number of slots, filled or reserved.
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if `id` names a filled node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.get(id.index()).is_some_and(|s| s.filled)
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.slots
            .get(id.index())
            .filter(|s| s.filled)
            .ok_or(Error::NodeNotFound(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.filled)
            .ok_or(Error::NodeNotFound(id))
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.slots.len() as u32)
    }

    /// Rate of the first source passed through `node`, or the default rate.
    fn inherited_rate(&self, node: &dyn Node) -> f64 {
        node.sources()
            .first()
            .and_then(|s| self.slots.get(s.index()))
            .map_or(self.settings.sample_rate, |s| node.output_rate(s.sample_rate))
    }

    fn place(&mut self, slot_index: usize, node: Box<dyn DynNode>, sample_rate: f64) {
        let slot = &mut self.slots[slot_index];
        slot.name = node.name();
        slot.sources = node.sources();
        slot.propagates = node.propagates_sample_rate();
        slot.sample_rate = sample_rate;
        slot.filled = true;
        slot.node = Some(node);
    }

    /// Adds a node, returning the handle to pull from it.
    ///
    /// The node starts at the sample rate of its first source (converted by
    /// [`Node::output_rate`]), or at the default rate if it has none.
    pub fn add<N: Node + 'static>(&mut self, node: N) -> NodeHandle {
        let rate = self.inherited_rate(&node);
        self.insert(Box::new(node), rate)
    }

    /// Adds a node running at an explicit sample rate.
    pub fn add_with_rate<N: Node + 'static>(&mut self, node: N, sample_rate: f64) -> Result<NodeHandle> {
        let rate = check_sample_rate(sample_rate)?;
        Ok(self.insert(Box::new(node), rate))
    }

    fn insert(&mut self, node: Box<dyn DynNode>, sample_rate: f64) -> NodeHandle {
        let id = self.next_id();
        self.slots.push(Slot::empty(sample_rate));
        self.place(id.index(), node, sample_rate);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_add: {} node {id} at {sample_rate} Hz",
            self.slots[id.index()].name
        );
        NodeHandle { id }
    }

    /// Reserves a slot to be filled later, for feedback topologies.
    pub fn reserve(&mut self) -> (NodeHandle, Reservation) {
        let id = self.next_id();
        self.slots.push(Slot::empty(self.settings.sample_rate));
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_reserve: node {id}");
        (NodeHandle { id }, Reservation { id })
    }

    /// Places `node` into a reserved slot.
    pub fn fill<N: Node + 'static>(&mut self, reservation: Reservation, node: N) -> Result<()> {
        let id = reservation.id;
        match self.slots.get(id.index()) {
            None => return Err(Error::NodeNotFound(id)),
            Some(slot) if slot.filled => return Err(Error::AlreadyFilled(id)),
            Some(_) => {}
        }
        let rate = self.inherited_rate(&node);
        self.place(id.index(), Box::new(node), rate);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_fill: node {id} is {}", self.slots[id.index()].name);
        Ok(())
    }

    /// Pulls up to `count` samples from the node behind `handle`.
    pub fn sample(&mut self, handle: &NodeHandle, count: usize) -> Result<Option<SampleBuffer>> {
        let id = handle.id;
        let slot = self.slot_mut(id)?;
        if slot.exhausted {
            return Ok(None);
        }
        if count == 0 {
            return Ok(Some(SampleBuffer::default()));
        }
        let mut node = slot.node.take().ok_or(Error::ReentrantPull(id))?;

        let result = node.sample(&mut PullContext { graph: self, node: id }, count);

        let slot = &mut self.slots[id.index()];
        slot.node = Some(node);
        match result? {
            Some(mut block) if !block.is_empty() => {
                block.truncate(count);
                Ok(Some(block))
            }
            _ => {
                slot.exhausted = true;
                #[cfg(feature = "tracing")]
                tracing::debug!("graph_sample: {} node {id} exhausted", slot.name);
                Ok(None)
            }
        }
    }

    /// The node behind `id` as its concrete type, for changing its parameters.
    ///
    /// Changes apply from the next pull. Fails with [`Error::NodeNotFound`] if
    /// the slot is empty or holds a different node type.
    pub fn node_mut<N: Node + 'static>(&mut self, id: NodeId) -> Result<&mut N> {
        self.slot_mut(id)?
            .node
            .as_mut()
            .and_then(|node| node.as_any_mut().downcast_mut::<N>())
            .ok_or(Error::NodeNotFound(id))
    }

    /// Returns true once the node has answered with end-of-stream.
    pub fn is_exhausted(&self, id: NodeId) -> Result<bool> {
        Ok(self.slot(id)?.exhausted)
    }

    /// Ids of the nodes `id` pulls from.
    pub fn sources(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.slot(id)?.sources)
    }

    /// Type name of the node.
    pub fn node_name(&self, id: NodeId) -> Result<&'static str> {
        Ok(self.slot(id)?.name)
    }

    /// Sample rate of the node.
    pub fn sample_rate(&self, id: NodeId) -> Result<f64> {
        Ok(self.slot(id)?.sample_rate)
    }

    /// Every node reachable from `root`, root first, each exactly once.
    ///
    /// The order is a depth-first post-order over sources, reversed. Cycles are
    /// cut at the first revisit.
    pub fn graph(&self, root: NodeId) -> Result<Vec<NodeId>> {
        self.slot(root)?;
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.visit(root, &mut visited, &mut order);
        order.reverse();
        Ok(order)
    }

    fn visit(&self, id: NodeId, visited: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
        if !visited.insert(id) {
            return;
        }
        if let Some(slot) = self.slots.get(id.index()) {
            for &source in &slot.sources {
                self.visit(source, visited, order);
            }
        }
        order.push(id);
    }

    /// Sets the sample rate of `id` and every node it reaches through its
    /// sources, stopping at rate converters. Returns the number of nodes
    /// updated.
    pub fn set_sample_rate(&mut self, id: NodeId, rate: f64) -> Result<usize> {
        let rate = check_sample_rate(rate)?;
        self.slot(id)?;

        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                continue;
            }
            let Some(slot) = self.slots.get_mut(next.index()) else {
                continue;
            };
            slot.sample_rate = rate;
            if slot.propagates {
                stack.extend(slot.sources.iter().copied());
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_set_sample_rate: {rate} Hz from {id}, {} nodes updated",
            visited.len()
        );
        Ok(visited.len())
    }
}
