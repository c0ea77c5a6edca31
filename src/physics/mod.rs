//! rapier3d-backed implementations of the world boundary oracles
//!
//! [`NavPhysics`] is a static collision world: terrain and obstacle boxes go
//! in, and the occupancy, height, and raycast oracles the navigation core
//! consumes come out. There is no dynamics stepping here; the host engine
//! owns real physics and can substitute its own oracle implementations.

use glam::Vec3;
use hecs::Entity;
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;

use crate::world::{HeightSampler, ObstacleRaycaster, OccupancyOracle, OverlapHit, RayHit};

/// Height from which ground probes are cast
const PROBE_HEIGHT: f32 = 1_000.0;

#[derive(Debug, Clone, Copy)]
struct ObjectTag {
    entity: Option<Entity>,
    passable: bool,
    terrain: bool,
}

/// Static collision world answering the navigation core's boundary queries.
///
/// Colliders are fixed; call [`NavPhysics::refresh`] after adding or
/// removing objects so the query pipeline sees the change.
pub struct NavPhysics {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    query_pipeline: QueryPipeline,
    tags: FxHashMap<ColliderHandle, ObjectTag>,
    by_entity: FxHashMap<Entity, ColliderHandle>,
}

impl NavPhysics {
    /// Create an empty collision world
    #[must_use]
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
            tags: FxHashMap::default(),
            by_entity: FxHashMap::default(),
        }
    }

    /// Add a terrain box. Terrain answers height probes and raycasts but
    /// never contests tiles.
    pub fn add_terrain_box(&mut self, center: Vec3, half_extents: Vec3) {
        let handle = self.insert_box(center, half_extents);
        self.tags.insert(
            handle,
            ObjectTag {
                entity: None,
                passable: true,
                terrain: true,
            },
        );
    }

    /// Add a world object's collision box. `passable` mirrors the object's
    /// tag: a passable object contests tiles without blocking them.
    pub fn add_obstacle(&mut self, entity: Entity, center: Vec3, half_extents: Vec3, passable: bool) {
        let handle = self.insert_box(center, half_extents);
        self.tags.insert(
            handle,
            ObjectTag {
                entity: Some(entity),
                passable,
                terrain: false,
            },
        );
        self.by_entity.insert(entity, handle);
    }

    /// Remove a tracked object's collider, if present
    pub fn remove_obstacle(&mut self, entity: Entity) {
        if let Some(handle) = self.by_entity.remove(&entity) {
            self.collider_set.remove(
                handle,
                &mut IslandManager::new(),
                &mut self.rigid_body_set,
                false,
            );
            self.tags.remove(&handle);
        }
    }

    /// Rebuild query acceleration structures after collider changes
    pub fn refresh(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    fn insert_box(&mut self, center: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![center.x, center.y, center.z])
            .build();
        self.collider_set.insert(collider)
    }

    fn tag(&self, handle: ColliderHandle) -> Option<ObjectTag> {
        self.tags.get(&handle).copied()
    }
}

impl Default for NavPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl OccupancyOracle for NavPhysics {
    fn overlaps(&self, center: Vec3, half_extents: Vec3) -> Vec<OverlapHit> {
        let shape = Cuboid::new(vector![half_extents.x, half_extents.y, half_extents.z]);
        let position = Isometry::translation(center.x, center.y, center.z);

        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &position,
            &shape,
            QueryFilter::default(),
            |handle| {
                if let Some(tag) = self.tag(handle) {
                    // Terrain underfoot is expected, not an occupant
                    if let (false, Some(object)) = (tag.terrain, tag.entity) {
                        hits.push(OverlapHit {
                            object,
                            passable_tag: tag.passable,
                        });
                    }
                }
                true
            },
        );
        hits
    }
}

impl HeightSampler for NavPhysics {
    fn sample_height(&self, x: f32, z: f32) -> f32 {
        let ray = Ray::new(point![x, PROBE_HEIGHT, z], vector![0.0, -1.0, 0.0]);
        let terrain_only =
            |handle: ColliderHandle, _: &Collider| self.tag(handle).is_some_and(|t| t.terrain);
        let filter = QueryFilter::default().predicate(&terrain_only);

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                2.0 * PROBE_HEIGHT,
                true,
                filter,
            )
            .map_or(0.0, |(_, toi)| ray.point_at(toi).y)
    }
}

impl ObstacleRaycaster for NavPhysics {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                QueryFilter::default(),
            )
            .map(|(handle, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                let tag = self.tag(handle);
                RayHit {
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                    object: tag.and_then(|t| t.entity),
                    terrain: tag.is_some_and(|t| t.terrain),
                }
            })
    }
}
