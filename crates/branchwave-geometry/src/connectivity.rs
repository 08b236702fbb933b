// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connectivity graph builder.

Converts an occupancy grid into:
1. `CellIndex` - a bijection between occupied positions and dense cell ids,
   assigned in row-major scan order
2. an edge list of `ConnectionEdge`s, one per 4-adjacent occupied pair

Only the right (+1 column) and down (+1 row) neighbor of each cell is tested,
so every adjacent pair appears exactly once. The edge list is still an
undirected network: consumers must treat each edge as bidirectional.
*/

use std::collections::VecDeque;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mesh::Mesh;
use crate::types::{CellId, GeometryError, GeometryResult, GridPos};

/// Conductance used when the caller does not supply one
pub const DEFAULT_CONDUCTANCE: f64 = 1.0;

/// Bidirectional lookup between occupied grid positions and cell ids.
///
/// Both directions are built together from one scan and never mutated, so
/// they cannot drift apart. Anything addressing cells by position goes
/// through this map instead of recomputing an index.
#[derive(Debug, Clone)]
pub struct CellIndex {
    /// id -> position (position of cell `i` is `positions[i]`)
    positions: Vec<GridPos>,
    /// position -> id
    ids: AHashMap<GridPos, CellId>,
    shape: (usize, usize),
}

impl CellIndex {
    /// Assign ids to every occupied cell of `mesh` in row-major order
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let positions: Vec<GridPos> = mesh.occupied_positions().collect();
        let ids = positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| (pos, CellId(i)))
            .collect();
        Self {
            positions,
            ids,
            shape: mesh.shape(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Grid shape the index was built from
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Cell id at `pos`, `None` for void or out-of-grid positions
    pub fn index_of(&self, pos: GridPos) -> Option<CellId> {
        self.ids.get(&pos).copied()
    }

    /// Position of `id`, `None` when out of range
    pub fn position_of(&self, id: CellId) -> Option<GridPos> {
        self.positions.get(id.index()).copied()
    }

    /// Like [`index_of`](Self::index_of) but fails for void positions
    pub fn require_index(&self, pos: GridPos) -> GeometryResult<CellId> {
        if pos.row >= self.shape.0 || pos.col >= self.shape.1 {
            return Err(GeometryError::OutOfBounds {
                pos,
                shape: self.shape,
            });
        }
        self.index_of(pos)
            .ok_or(GeometryError::PositionNotOccupied(pos))
    }

    /// (id, position) pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (CellId, GridPos)> + '_ {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| (CellId(i), pos))
    }

    /// Position -> index pairs for the solver interchange
    pub fn to_pairs(&self) -> Vec<((usize, usize), usize)> {
        self.iter()
            .map(|(id, pos)| ((pos.row, pos.col), id.index()))
            .collect()
    }
}

/// Undirected conductance link between two adjacent cells
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEdge {
    pub source: CellId,
    pub target: CellId,
    pub conductance: f64,
}

impl ConnectionEdge {
    /// (source, target, conductance) triple handed to the solver
    pub fn as_triple(&self) -> (usize, usize, f64) {
        (self.source.index(), self.target.index(), self.conductance)
    }
}

/// Cell index plus edge list for one mesh
#[derive(Debug, Clone)]
pub struct ConnectivityGraph {
    index: CellIndex,
    edges: Vec<ConnectionEdge>,
}

/// Build the cell index and edge list for `mesh`.
///
/// A disconnected mesh still yields a valid graph; use
/// [`ConnectivityGraph::ensure_connected`] when connectivity is required.
pub fn build_connectivity(mesh: &Mesh, conductance: f64) -> GeometryResult<ConnectivityGraph> {
    if !conductance.is_finite() || conductance <= 0.0 {
        return Err(GeometryError::InvalidConductance(conductance));
    }

    let index = CellIndex::from_mesh(mesh);
    let mut edges = Vec::with_capacity(index.len() * 2);

    for (source, pos) in index.iter() {
        for neighbor in [pos.right(), pos.down()] {
            if let Some(target) = index.index_of(neighbor) {
                edges.push(ConnectionEdge {
                    source,
                    target,
                    conductance,
                });
            }
        }
    }

    debug!(
        "[CONNECTIVITY] Built graph: {} cells, {} edges, conductance {}",
        index.len(),
        edges.len(),
        conductance
    );

    Ok(ConnectivityGraph { index, edges })
}

impl ConnectivityGraph {
    pub fn index(&self) -> &CellIndex {
        &self.index
    }

    pub fn edges(&self) -> &[ConnectionEdge] {
        &self.edges
    }

    pub fn cell_count(&self) -> usize {
        self.index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edge list as (source, target, conductance) triples
    pub fn edge_triples(&self) -> Vec<(usize, usize, f64)> {
        self.edges.iter().map(ConnectionEdge::as_triple).collect()
    }

    /// Undirected adjacency list indexed by cell id
    pub fn adjacency(&self) -> Vec<Vec<CellId>> {
        let mut adjacency = vec![Vec::new(); self.index.len()];
        for edge in &self.edges {
            adjacency[edge.source.index()].push(edge.target);
            adjacency[edge.target.index()].push(edge.source);
        }
        adjacency
    }

    /// Connected components found by breadth-first search.
    ///
    /// Components are ordered by their smallest cell id and each lists its
    /// cells in ascending id order.
    pub fn connected_components(&self) -> Vec<Vec<CellId>> {
        let adjacency = self.adjacency();
        let mut visited = vec![false; adjacency.len()];
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..adjacency.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            queue.push_back(start);
            let mut component = Vec::new();

            while let Some(current) = queue.pop_front() {
                component.push(CellId(current));
                for neighbor in &adjacency[current] {
                    let n = neighbor.index();
                    if !visited[n] {
                        visited[n] = true;
                        queue.push_back(n);
                    }
                }
            }

            component.sort_unstable();
            components.push(component);
        }

        components
    }

    /// True when every cell is reachable from every other (an empty graph counts)
    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// Fail with `Disconnected` unless the graph forms a single component
    pub fn ensure_connected(&self) -> GeometryResult<()> {
        let components = self.connected_components().len();
        if components > 1 {
            warn!(
                "[CONNECTIVITY] ❌ Geometry splits into {} disconnected components",
                components
            );
            return Err(GeometryError::Disconnected { components });
        }
        Ok(())
    }
}
