/*!
# Branchwave Geometry

Foundation layer for branch-channel conduction experiments:
- Rasterization of parametric branch geometries into occupancy grids
- Connectivity graphs (cell index + conductance edge list) for a cable solver
- Stimulation and measurement regions resolved through the cell index

## Pipeline

```text
BranchGeometry --rasterize--> Mesh --build_connectivity--> ConnectivityGraph
                                                          (CellIndex, edges)
```

Every artifact is built once and read-only afterwards.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod connectivity;
pub mod mesh;
pub mod rasterizer;
pub mod regions;
pub mod types;

pub use connectivity::{
    build_connectivity, CellIndex, ConnectionEdge, ConnectivityGraph, DEFAULT_CONDUCTANCE,
};
pub use mesh::Mesh;
pub use rasterizer::{
    AngleBranchParams, BranchGeometry, GeometryAdvisory, Rasterization, SlopeBranchParams,
    BOUNDARY_TOLERANCE, MAX_GRID_CELLS,
};
pub use regions::{main_channel_columns, stimulation_region, CellRegion, StimulationSide};
pub use types::{CellId, GeometryError, GeometryResult, GridPos};
