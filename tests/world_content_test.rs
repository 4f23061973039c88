//! # World Content Integration Tests
//!
//! Generation, meshing, targeting and the chunk codec exercised through the public API.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};
use voxel_sandbox::engine_state::rendering::meshing::{build_mesh, MeshRegion, DEFAULT_VERTEX_CAPACITY};
use voxel_sandbox::engine_state::voxels::{
    block::block_type::BlockId,
    chunk::{chunk_packing, Chunk, CHUNK_HEIGHT, CHUNK_SIZE},
    raycast,
    terrain::{
        trees::{place_tree, TreeSpecies},
        TerrainGenerator,
    },
    world::{BlockLookup, ChunkKey, ChunkMap},
};

fn flat_grass(height: i32) -> Chunk {
    let mut chunk = Chunk::empty();
    for x in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            for y in 0..height {
                chunk.set(x, y, z, BlockId::Dirt);
            }
            chunk.set(x, height, z, BlockId::GrassBlock);
        }
    }
    chunk
}

/// Test: the same seed yields byte-identical chunks and meshes.
#[test]
fn test_generation_and_meshing_are_deterministic() {
    let a = TerrainGenerator::new(2024);
    let b = TerrainGenerator::new(2024);
    let keys = [ChunkKey::new(0, 0), ChunkKey::new(-3, 7)];

    let world_a: ChunkMap = keys.iter().map(|&key| (key, a.generate(key))).collect();
    let world_b: ChunkMap = keys.iter().map(|&key| (key, b.generate(key))).collect();
    for key in keys {
        assert_eq!(chunk_packing::pack(&world_a[&key]), chunk_packing::pack(&world_b[&key]));
    }

    let center = Point3::new(-80.0, 20.0, 230.0);
    let mesh_a = build_mesh(&world_a, MeshRegion::Chunk(keys[1]), center, 128.0, DEFAULT_VERTEX_CAPACITY);
    let mesh_b = build_mesh(&world_b, MeshRegion::Chunk(keys[1]), center, 128.0, DEFAULT_VERTEX_CAPACITY);
    assert_eq!(mesh_a.terrain.position_bytes(), mesh_b.terrain.position_bytes());
    assert_eq!(mesh_a.terrain.uv_bytes(), mesh_b.terrain.uv_bytes());
    assert_eq!(mesh_a.grass.position_bytes(), mesh_b.grass.position_bytes());
}

/// Test: every terrain quad sits between a solid voxel and a transparent one.
#[test]
fn test_every_face_separates_solid_from_transparent() {
    let generator = TerrainGenerator::new(7);
    let mut world = ChunkMap::new();
    for cx in -1..=1 {
        for cz in -1..=1 {
            world.insert(ChunkKey::new(cx, cz), generator.generate(ChunkKey::new(cx, cz)));
        }
    }

    let mesh = build_mesh(
        &world,
        MeshRegion::Chunk(ChunkKey::new(0, 0)),
        Point3::new(16.0, 16.0, 16.0),
        1000.0,
        DEFAULT_VERTEX_CAPACITY,
    );
    assert!(mesh.terrain.vertex_count() > 0);

    for quad in mesh.terrain.quads() {
        let normal = quad[0].1;
        // Corners a, b, c, d are vertices 0, 1, 2 and 5.
        let mut center = [0.0f32; 3];
        for i in [0, 1, 2, 5] {
            for axis in 0..3 {
                center[axis] += quad[i].0[axis] * 0.25;
            }
        }
        let voxel = |sign: f32| {
            let p: Vec<i32> = (0..3).map(|axis| (center[axis] + sign * 0.5 * normal[axis]).floor() as i32).collect();
            world.block_at(p[0], p[1], p[2])
        };
        assert!(voxel(-1.0).is_solid(), "face at {center:?} has no solid block behind it");
        assert!(voxel(1.0).is_transparent(), "face at {center:?} is covered");
    }
}

/// Test: plants are never meshed as cubes.
#[test]
fn test_plants_only_produce_billboards() {
    let mut chunk = flat_grass(4);
    chunk.set(10, 5, 10, BlockId::Grass);
    let world = ChunkMap::from([(ChunkKey::new(0, 0), chunk)]);
    let with_plant = build_mesh(&world, MeshRegion::Chunk(ChunkKey::new(0, 0)), Point3::new(10.0, 6.0, 10.0), 1000.0, DEFAULT_VERTEX_CAPACITY);
    assert_eq!(with_plant.grass.vertex_count(), 24);

    let bare = ChunkMap::from([(ChunkKey::new(0, 0), flat_grass(4))]);
    let without = build_mesh(&bare, MeshRegion::Chunk(ChunkKey::new(0, 0)), Point3::new(10.0, 6.0, 10.0), 1000.0, DEFAULT_VERTEX_CAPACITY);
    assert_eq!(with_plant.terrain, without.terrain);
}

/// Test: aiming along +Z at a lone block hits it and places in front of it.
#[test]
fn test_raycast_hits_and_reports_placement_voxel() {
    let mut chunk = Chunk::empty();
    chunk.set(0, 0, 0, BlockId::Dirt);
    let mut world: ChunkMap = HashMap::new();
    world.insert(ChunkKey::new(0, 0), chunk);
    world.insert(ChunkKey::new(0, -1), Chunk::empty());

    let hit = raycast::cast(Point3::new(0.5, 0.5, -2.5), Vector3::new(0.0, 0.0, 1.0), 5.0, &world).unwrap();
    assert_eq!(hit.block, Point3::new(0, 0, 0));
    assert_eq!(hit.previous, Point3::new(0, 0, -1));

    assert_eq!(raycast::cast(Point3::new(0.5, 0.5, -2.5), Vector3::new(0.0, 0.0, 1.0), 2.0, &world), None);
    assert_eq!(raycast::cast(Point3::new(0.5, 0.5, -2.5), Vector3::new(0.0, 0.0, -1.0), 5.0, &world), None);
}

/// Test: generated plants always stand on a grass block, trees included.
#[test]
fn test_generated_plants_stand_on_grass_blocks() {
    let generator = TerrainGenerator::new(31);
    let mut plants = 0;
    for key in [ChunkKey::new(0, 0), ChunkKey::new(1, 4), ChunkKey::new(-6, 2)] {
        let chunk = generator.generate(key);
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for y in 1..CHUNK_HEIGHT {
                    if chunk.get(x, y, z) == BlockId::Grass {
                        plants += 1;
                        assert_eq!(chunk.get(x, y - 1, z), BlockId::GrassBlock, "plant at ({x}, {y}, {z})");
                    }
                }
            }
        }
    }
    assert!(plants > 0);
}

/// Test: an oak planted next to a chunk edge is rejected, one in the middle grows.
#[test]
fn test_tree_sites_respect_the_chunk_border() {
    let mut chunk = flat_grass(10);
    assert!(!place_tree(&mut chunk, 0, 10, 16, TreeSpecies::Oak, 4, 0));
    assert!(place_tree(&mut chunk, 16, 10, 16, TreeSpecies::Oak, 4, 0));
    assert_eq!(chunk.get(16, 11, 16), BlockId::Wood);
    assert_eq!(chunk.get(16, 10, 16), BlockId::GrassBlock);
}

/// Test: generated chunks survive the codec unchanged.
#[test]
fn test_generated_chunks_round_trip_through_the_codec() {
    let generator = TerrainGenerator::new(99);
    for key in [ChunkKey::new(0, 0), ChunkKey::new(5, -2), ChunkKey::new(-9, -9)] {
        let chunk = generator.generate(key);
        let packed = chunk_packing::pack(&chunk);
        assert_eq!(chunk_packing::unpack(&packed).unwrap(), chunk);
    }
}
