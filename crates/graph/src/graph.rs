use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};

use foundation::geo::LngLatAlt;
use formats::{CoreImageContract, ImageContract, SequenceContract, SpatialImageContract};
use tracing::debug;

use crate::calculator::spatial_area_bounds;
use crate::config::GraphConfig;
use crate::edge::{NavigationDirection, NavigationEdge, NodeEdges};
use crate::edge_calculator::EdgeCalculator;
use crate::error::GraphError;
use crate::filter::NodeFilter;
use crate::node::{Node, NodeId, SpatialData};
use crate::sequence::Sequence;
use crate::spatial::{Item, SpatialIndex};

/// Node arena with a separate adjacency table.
///
/// Nodes are never removed: metadata lives for the whole session and only
/// loaded assets are evicted elsewhere. The first inserted node fixes the
/// reference origin of every node translation.
#[derive(Debug)]
pub struct Graph {
    config: GraphConfig,
    calculator: EdgeCalculator,
    nodes: Vec<Node>,
    keys: BTreeMap<String, NodeId>,
    sequences: BTreeMap<String, Sequence>,
    /// Built on the first query after an insert.
    index: OnceCell<SpatialIndex>,
    cells: BTreeSet<String>,
    edges: BTreeMap<NodeId, NodeEdges>,
    reference: Option<LngLatAlt>,
    filter: NodeFilter,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl Graph {
    pub fn new(config: GraphConfig) -> Self {
        let calculator = EdgeCalculator::new(config.settings.clone(), config.coefficients.clone());
        Self {
            config,
            calculator,
            nodes: Vec::new(),
            keys: BTreeMap::new(),
            sequences: BTreeMap::new(),
            index: OnceCell::new(),
            cells: BTreeSet::new(),
            edges: BTreeMap::new(),
            reference: None,
            filter: NodeFilter::allow_all(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reference origin shared by all node translations, set by the first
    /// inserted node.
    pub fn reference(&self) -> Option<LngLatAlt> {
        self.reference
    }

    /// Insert core records, skipping keys already present. Returns the number
    /// of new nodes.
    pub fn insert_core_nodes(&mut self, images: &[CoreImageContract]) -> usize {
        let mut inserted = 0;
        for image in images {
            if self.keys.contains_key(&image.id) {
                continue;
            }
            let id = NodeId(self.nodes.len() as u32);
            let node = Node::from_core(id, image);
            if self.reference.is_none() {
                self.reference = Some(node.lng_lat().with_alt(0.0));
            }
            self.keys.insert(image.id.clone(), id);
            self.nodes.push(node);
            inserted += 1;
        }
        if inserted > 0 {
            self.index.take();
        }
        inserted
    }

    /// Insert the core records of a spatial cell and remember the cell as
    /// loaded.
    pub fn insert_cell(&mut self, cell_id: impl Into<String>, images: &[CoreImageContract]) -> usize {
        let cell_id = cell_id.into();
        let inserted = self.insert_core_nodes(images);
        debug!("cell {cell_id}: {inserted} new nodes");
        self.cells.insert(cell_id);
        inserted
    }

    pub fn has_cell(&self, cell_id: &str) -> bool {
        self.cells.contains(cell_id)
    }

    /// Attach spatial metadata to an existing node. Already full nodes are
    /// left unchanged.
    pub fn make_full(&mut self, spatial: &SpatialImageContract) -> Result<(), GraphError> {
        let id = self.id_of(&spatial.id)?;
        let reference = self.reference.unwrap_or_default();
        let default_altitude = self.config.default_altitude;
        let node = &mut self.nodes[id.index()];
        if !node.is_full() {
            node.make_full(SpatialData::from_contract(spatial, default_altitude), reference);
        }
        Ok(())
    }

    /// Insert complete records: core upsert followed by spatial data.
    pub fn insert_full(&mut self, images: &[ImageContract]) -> Result<(), GraphError> {
        let cores: Vec<CoreImageContract> = images.iter().map(ImageContract::core).collect();
        self.insert_core_nodes(&cores);
        for image in images {
            self.make_full(&image.spatial())?;
        }
        Ok(())
    }

    /// Store sequences. A sequence is immutable once stored; repeated ids are
    /// ignored.
    pub fn insert_sequences(&mut self, sequences: &[SequenceContract]) {
        for contract in sequences {
            self.sequences
                .entry(contract.id.clone())
                .or_insert_with(|| Sequence::new(contract.id.clone(), contract.image_ids.clone()));
        }
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.keys.get(key).map(|id| &self.nodes[id.index()])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn has_sequence(&self, id: &str) -> bool {
        self.sequences.contains_key(id)
    }

    pub fn sequence(&self, id: &str) -> Option<&Sequence> {
        self.sequences.get(id)
    }

    /// Sequence of the node with `key`, if loaded.
    pub fn node_sequence(&self, key: &str) -> Result<Option<&Sequence>, GraphError> {
        let node = self.get(key)?;
        Ok(self.sequences.get(node.sequence_id()))
    }

    /// Full with a finite position: edges can be computed.
    pub fn is_worthy(&self, key: &str) -> bool {
        self.node(key).is_some_and(|node| {
            let p = node.lng_lat();
            node.is_full() && p.lng.is_finite() && p.lat.is_finite()
        })
    }

    /// Nodes inside the edge search box around `key`, excluding the node
    /// itself, in insertion order.
    pub fn spatial_area(&self, key: &str) -> Result<Vec<&Node>, GraphError> {
        let node = self.get(key)?;
        let bounds = spatial_area_bounds(node.lng_lat(), self.config.spatial_area_threshold);
        Ok(self
            .spatial_index()
            .query(&bounds)
            .into_iter()
            .filter(|id| *id != node.id())
            .map(|id| &self.nodes[id.index()])
            .collect())
    }

    /// Keys in the spatial area of `key` (the node included) still lacking
    /// spatial metadata.
    pub fn missing_fill(&self, key: &str) -> Result<Vec<String>, GraphError> {
        let node = self.get(key)?;
        let mut missing: Vec<String> = self
            .spatial_area(key)?
            .into_iter()
            .chain(std::iter::once(node))
            .filter(|n| !n.is_full())
            .map(|n| n.key().to_string())
            .collect();
        missing.sort();
        Ok(missing)
    }

    pub fn has_edges(&self, key: &str) -> bool {
        self.keys
            .get(key)
            .and_then(|id| self.edges.get(id))
            .is_some_and(NodeEdges::is_complete)
    }

    pub fn edges(&self, key: &str) -> Option<&NodeEdges> {
        self.keys.get(key).and_then(|id| self.edges.get(id))
    }

    /// First edge from `key` in `direction`, if computed.
    pub fn edge(&self, key: &str, direction: NavigationDirection) -> Option<&NavigationEdge> {
        self.edges(key).and_then(|edges| edges.find(direction))
    }

    /// Compute the missing parts of the adjacency of `key`.
    ///
    /// Returns `Ok(false)` when the node is not worthy. Sequence edges are
    /// computed once the node's sequence is stored; spatial edges use the full
    /// nodes currently in the spatial area that pass the filter.
    pub fn compute_edges(&mut self, key: &str) -> Result<bool, GraphError> {
        let id = self.id_of(key)?;
        if !self.is_worthy(key) {
            return Ok(false);
        }

        let node = &self.nodes[id.index()];
        let current = self.edges.get(&id).cloned().unwrap_or_default();
        let sequence = self.sequences.get(node.sequence_id());

        let sequence_edges = match (&current.sequence, sequence) {
            (Some(edges), _) => Some(edges.clone()),
            (None, Some(sequence)) => Some(self.calculator.compute_sequence_edges(node, sequence)?),
            (None, None) => None,
        };

        let spatial_edges = match current.spatial {
            Some(edges) => edges,
            None => {
                let prev = sequence.and_then(|s| s.find_prev(key));
                let next = sequence.and_then(|s| s.find_next(key));

                let mut candidates: Vec<&Node> = self
                    .spatial_area(key)?
                    .into_iter()
                    .filter(|n| n.is_full() && self.filter.matches(n))
                    .collect();
                let mut fallback_keys: Vec<&str> = Vec::new();
                for neighbor in [prev, next].into_iter().flatten() {
                    fallback_keys.push(neighbor);
                    if let Some(n) = self.node(neighbor)
                        && n.is_full()
                        && self.filter.matches(n)
                        && !candidates.iter().any(|c| c.id() == n.id())
                    {
                        candidates.push(n);
                    }
                }

                let potentials =
                    self.calculator
                        .get_potential_edges(node, &candidates, &fallback_keys)?;
                let mut edges = self
                    .calculator
                    .compute_step_edges(node, &potentials, prev, next)?;
                edges.extend(self.calculator.compute_turn_edges(node, &potentials)?);
                edges.extend(self.calculator.compute_spherical_edges(node, &potentials)?);
                edges.extend(
                    self.calculator
                        .compute_perspective_to_spherical_edges(node, &potentials)?,
                );
                edges.extend(self.calculator.compute_similar_edges(node, &potentials)?);
                debug!(
                    "edges for {key}: {} candidates, {} potentials, {} edges",
                    candidates.len(),
                    potentials.len(),
                    edges.len()
                );
                edges
            }
        };

        self.edges.insert(
            id,
            NodeEdges {
                sequence: sequence_edges,
                spatial: Some(spatial_edges),
            },
        );
        Ok(true)
    }

    pub fn filter(&self) -> &NodeFilter {
        &self.filter
    }

    /// Replace the edge target filter. Every computed spatial adjacency is
    /// dropped; sequence edges do not depend on the filter.
    pub fn set_filter(&mut self, filter: NodeFilter) {
        self.filter = filter;
        let mut invalidated = 0;
        for edges in self.edges.values_mut() {
            if edges.spatial.take().is_some() {
                invalidated += 1;
            }
        }
        debug!("filter changed: {invalidated} spatial adjacencies invalidated");
    }

    fn get(&self, key: &str) -> Result<&Node, GraphError> {
        self.node(key)
            .ok_or_else(|| GraphError::UnknownNode(key.to_string()))
    }

    fn id_of(&self, key: &str) -> Result<NodeId, GraphError> {
        self.keys
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(key.to_string()))
    }

    fn spatial_index(&self) -> &SpatialIndex {
        self.index.get_or_init(|| {
            let items = self
                .nodes
                .iter()
                .map(|n| {
                    let p = n.lng_lat();
                    Item::point(n.id(), p.lng, p.lat)
                })
                .collect();
            SpatialIndex::build(items)
        })
    }
}
