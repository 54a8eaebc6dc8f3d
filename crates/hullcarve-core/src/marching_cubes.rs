//! Marching Cubes isosurface extraction over voxel occupancy.
//!
//! The voxel field is surrounded by one layer of empty voxels before extraction, so
//! occupied voxels touching the grid boundary still produce a closed surface. Vertices
//! shared between neighbouring cells are emitted once, tracked per edge in a two-layer
//! slab of vertex indices.

#![allow(clippy::unreadable_literal, clippy::cast_possible_truncation)]

use glam::{UVec3, Vec3};

use crate::error::{HullError, Result};
use crate::mesh::Mesh;
use crate::voxel_grid::VoxelGrid;

/// Default isovalue: strictly between empty (0) and occupied (1).
pub const DEFAULT_ISOVALUE: f32 = 0.5;

/// Cell corner offsets; bit 0 of the corner number is +X, bit 1 is +Y, bit 2 is +Z.
const CORNERS: [[u32; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Cell edges as `(start corner, end corner, axis)`, numbered as in [`MC_TRIS`].
const EDGES: [(usize, usize, usize); 12] = [
    (0, 1, 0),
    (2, 3, 0),
    (4, 5, 0),
    (6, 7, 0),
    (0, 2, 1),
    (1, 3, 1),
    (4, 6, 1),
    (5, 7, 1),
    (0, 4, 2),
    (1, 5, 2),
    (2, 6, 2),
    (3, 7, 2),
];

/// Extracts the isosurface of a scalar field with marching cubes.
///
/// # Arguments
/// * `field` - Scalar values in C-contiguous order: node `(ix, iy, iz)` is stored at
///   `(ix * ny + iy) * nz + iz`.
/// * `isovalue` - Nodes with a value strictly greater than this are inside.
/// * `dims` - Number of nodes along each axis.
///
/// # Returns
/// A mesh with vertices in node-index space, triangles wound counter-clockwise when seen
/// from the outside (the side of lower values).
///
/// # Panics
/// Panics if `field.len()` does not match `dims` or if any dimension is less than 2.
#[must_use]
pub fn marching_cubes(field: &[f32], isovalue: f32, dims: UVec3) -> Mesh {
    let node_count = dims.x as usize * dims.y as usize * dims.z as usize;
    assert!(
        field.len() == node_count,
        "Field size {} does not match dimensions {}x{}x{} = {}",
        field.len(),
        dims.x,
        dims.y,
        dims.z,
        node_count
    );
    assert!(dims.min_element() >= 2, "All dimensions must be >= 2");

    let mut mesh = Mesh::default();
    let mut slab = EdgeSlab::new(dims);
    let mut values = [0.0_f32; 8];
    let mut edge_vertices = [0_u32; 12];

    for z in 0..dims.z - 1 {
        for y in 0..dims.y - 1 {
            for x in 0..dims.x - 1 {
                let cell = UVec3::new(x, y, z);
                let mut config = 0_usize;
                for (corner, offset) in CORNERS.iter().enumerate() {
                    let node = cell + UVec3::from_array(*offset);
                    values[corner] = field[node_index(node, dims)] - isovalue;
                    if values[corner] > 0.0 {
                        config |= 1 << corner;
                    }
                }

                // Fully inside or fully outside
                if config == 0 || config == 255 {
                    continue;
                }

                for (edge, &(a, b, axis)) in EDGES.iter().enumerate() {
                    let start = cell + UVec3::from_array(CORNERS[a]);
                    if owns_edge(cell, CORNERS[a], axis) {
                        slab.compute(&mut mesh, values[a], values[b], start, axis);
                    }
                    edge_vertices[edge] = slab.get(start, axis);
                }

                let entry = MC_TRIS[config];
                let n_triangles = (entry & 0xF) as usize;
                let index_base = mesh.indices.len();
                for i in 0..n_triangles * 3 {
                    let edge = ((entry >> (4 + 4 * i)) & 0xF) as usize;
                    mesh.indices.push(edge_vertices[edge]);
                }
                for tri in mesh.indices[index_base..].chunks_exact(3) {
                    let n = mesh.face_normal([tri[0], tri[1], tri[2]]);
                    for &v in tri {
                        mesh.normals[v as usize] += n;
                    }
                }
            }
        }
    }

    for normal in &mut mesh.normals {
        *normal = normal.normalize_or_zero();
    }
    mesh
}

/// Converts 3D node coordinates to a field index.
#[inline]
fn node_index(node: UVec3, dims: UVec3) -> usize {
    (node.x as usize * dims.y as usize + node.y as usize) * dims.z as usize + node.z as usize
}

/// Whether `cell` is the first cell in scan order to touch the edge starting at its
/// corner `offset` along `axis`. Every other cell reads the vertex from the slab.
#[inline]
fn owns_edge(cell: UVec3, offset: [u32; 3], axis: usize) -> bool {
    (0..3).all(|a| a == axis || offset[a] == 1 || cell[a] == 0)
}

/// Vertex indices of the edges in the current and next Z layer of nodes.
struct EdgeSlab {
    dims: UVec3,
    inds: Vec<[u32; 3]>,
}

impl EdgeSlab {
    fn new(dims: UVec3) -> Self {
        Self {
            dims,
            inds: vec![[0; 3]; dims.x as usize * dims.y as usize * 2],
        }
    }

    #[inline]
    fn slot(&self, node: UVec3) -> usize {
        let layer = self.dims.x as usize * self.dims.y as usize;
        layer * (node.z as usize % 2) + node.y as usize * self.dims.x as usize + node.x as usize
    }

    #[inline]
    fn get(&self, node: UVec3, axis: usize) -> u32 {
        self.inds[self.slot(node)][axis]
    }

    /// Emits the crossing vertex of the edge from `node` along `axis`, if the surface
    /// crosses it. `va` and `vb` are the endpoint values relative to the isovalue.
    #[allow(clippy::cast_precision_loss)]
    fn compute(&mut self, mesh: &mut Mesh, va: f32, vb: f32, node: UVec3, axis: usize) {
        if (va > 0.0) == (vb > 0.0) {
            return;
        }
        // t = (iso - f(a)) / (f(b) - f(a)), clamped for equal endpoint values
        let t = (va / (va - vb)).clamp(0.0, 1.0);
        let mut p = node.as_vec3();
        p[axis] += if t.is_finite() { t } else { 0.5 };
        let slot = self.slot(node);
        self.inds[slot][axis] = mesh.positions.len() as u32;
        mesh.positions.push(p);
        mesh.normals.push(Vec3::ZERO);
    }
}

/// Extracts a surface from a carved [`VoxelGrid`], treating occupied voxels as 1 and
/// empty voxels as 0.
#[derive(Debug, Clone, Copy)]
pub struct MarchingCubesMesher {
    isovalue: f32,
}

impl Default for MarchingCubesMesher {
    fn default() -> Self {
        Self {
            isovalue: DEFAULT_ISOVALUE,
        }
    }
}

impl MarchingCubesMesher {
    /// Creates a mesher for `isovalue`.
    ///
    /// On a binary field `1.0` yields an empty mesh and `0.0` places every vertex on an
    /// empty voxel center; both are valid.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidParameters`] unless `isovalue` lies in `[0, 1]`.
    pub fn new(isovalue: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&isovalue) {
            return Err(HullError::InvalidParameters(format!(
                "isovalue {isovalue} is outside [0, 1]"
            )));
        }
        Ok(Self { isovalue })
    }

    pub fn isovalue(&self) -> f32 {
        self.isovalue
    }

    /// Meshes `grid` in world space. Never fails; an empty mesh is a valid result.
    pub fn mesh(&self, grid: &VoxelGrid) -> Mesh {
        let padded = grid.resolution() + 2;
        let dims = UVec3::splat(padded);
        let mut field = vec![0.0_f32; padded as usize * padded as usize * padded as usize];
        for i in 0..grid.resolution() {
            for j in 0..grid.resolution() {
                for k in 0..grid.resolution() {
                    let voxel = UVec3::new(i, j, k);
                    if grid.is_occupied(voxel) {
                        field[node_index(voxel + UVec3::ONE, dims)] = 1.0;
                    }
                }
            }
        }

        let mut mesh = marching_cubes(&field, self.isovalue, dims);

        // Padded node n sits on the center of voxel n - 1
        let origin = grid.bounds().min - Vec3::splat(0.5 * grid.voxel_size());
        let size = grid.voxel_size();
        for p in &mut mesh.positions {
            *p = origin + *p * size;
        }

        if mesh.is_empty() {
            log::warn!(
                "isosurface at {} is empty for {} occupied voxels",
                self.isovalue,
                grid.occupied_count()
            );
        } else {
            log::info!(
                "meshed {} vertices, {} triangles",
                mesh.num_vertices(),
                mesh.num_triangles()
            );
        }
        mesh
    }
}

/// Look-up table for triangle configurations (256 entries, one per cube configuration).
///
/// Each entry is a `u64` encoding:
/// - Bits `[3:0]`: Number of triangles (0-5)
/// - Bits `[7:4]`, `[11:8]`, ...: Edge indices (0-11) for each triangle vertex, 4 bits each
///
/// Table data from `MarchingCubeCpp` (public domain).
#[rustfmt::skip]
static MC_TRIS: [u64; 256] = [
    0, 33793, 36945, 159668546,
    18961, 144771090, 5851666, 595283255635,
    20913, 67640146, 193993474, 655980856339,
    88782242, 736732689667, 797430812739, 194554754,
    26657, 104867330, 136709522, 298069416227,
    109224258, 8877909667, 318136408323, 1567994331701604,
    189884450, 350847647843, 559958167731, 3256298596865604,
    447393122899, 651646838401572, 2538311371089956, 737032694307,
    29329, 43484162, 91358498, 374810899075,
    158485010, 178117478419, 88675058979, 433581536604804,
    158486962, 649105605635, 4866906995, 3220959471609924,
    649165714851, 3184943915608436, 570691368417972, 595804498035,
    124295042, 431498018963, 508238522371, 91518530,
    318240155763, 291789778348404, 1830001131721892, 375363605923,
    777781811075, 1136111028516116, 3097834205243396, 508001629971,
    2663607373704004, 680242583802939237, 333380770766129845, 179746658,
    42545, 138437538, 93365810, 713842853011,
    73602098, 69575510115, 23964357683, 868078761575828,
    28681778, 713778574611, 250912709379, 2323825233181284,
    302080811955, 3184439127991172, 1694042660682596, 796909779811,
    176306722, 150327278147, 619854856867, 1005252473234484,
    211025400963, 36712706, 360743481544788, 150627258963,
    117482600995, 1024968212107700, 2535169275963444, 4734473194086550421,
    628107696687956, 9399128243, 5198438490361643573, 194220594,
    104474994, 566996932387, 427920028243, 2014821863433780,
    492093858627, 147361150235284, 2005882975110676, 9671606099636618005,
    777701008947, 3185463219618820, 482784926917540, 2900953068249785909,
    1754182023747364, 4274848857537943333, 13198752741767688709, 2015093490989156,
    591272318771, 2659758091419812, 1531044293118596, 298306479155,
    408509245114388, 210504348563, 9248164405801223541, 91321106,
    2660352816454484, 680170263324308757, 8333659837799955077, 482966828984116,
    4274926723105633605, 3184439197724820, 192104450, 15217,
    45937, 129205250, 129208402, 529245952323,
    169097138, 770695537027, 382310500883, 2838550742137652,
    122763026, 277045793139, 81608128403, 1991870397907988,
    362778151475, 2059003085103236, 2132572377842852, 655681091891,
    58419234, 239280858627, 529092143139, 1568257451898804,
    447235128115, 679678845236084, 2167161349491220, 1554184567314086709,
    165479003923, 1428768988226596, 977710670185060, 10550024711307499077,
    1305410032576132, 11779770265620358997, 333446212255967269, 978168444447012,
    162736434, 35596216627, 138295313843, 891861543990356,
    692616541075, 3151866750863876, 100103641866564, 6572336607016932133,
    215036012883, 726936420696196, 52433666, 82160664963,
    2588613720361524, 5802089162353039525, 214799000387, 144876322,
    668013605731, 110616894681956, 1601657732871812, 430945547955,
    3156382366321172, 7644494644932993285, 3928124806469601813, 3155990846772900,
    339991010498708, 10743689387941597493, 5103845475, 105070898,
    3928064910068824213, 156265010, 1305138421793636, 27185,
    195459938, 567044449971, 382447549283, 2175279159592324,
    443529919251, 195059004769796, 2165424908404116, 1554158691063110021,
    504228368803, 1436350466655236, 27584723588724, 1900945754488837749,
    122971970, 443829749251, 302601798803, 108558722,
    724700725875, 43570095105972, 2295263717447940, 2860446751369014181,
    2165106202149444, 69275726195, 2860543885641537797, 2165106320445780,
    2280890014640004, 11820349930268368933, 8721082628082003989, 127050770,
    503707084675, 122834978, 2538193642857604, 10129,
    801441490467, 2923200302876740, 1443359556281892, 2901063790822564949,
    2728339631923524, 7103874718248233397, 12775311047932294245, 95520290,
    2623783208098404, 1900908618382410757, 137742672547, 2323440239468964,
    362478212387, 727199575803140, 73425410, 34337,
    163101314, 668566030659, 801204361987, 73030562,
    591509145619, 162574594, 100608342969108, 5553,
    724147968595, 1436604830452292, 176259090, 42001,
    143955266, 2385, 18433, 0,
];
