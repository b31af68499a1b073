//! Spatial Queries
//!
//! World probes used by ranged actions to find what blocks their aim.

use action_events::NetId;
use glam::Vec3;

/// First blocking obstruction found by a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Point on the blocker's surface that was hit
    pub impact_point: Vec3,
    /// Distance travelled by the sweep before the hit
    pub distance: f32,
    /// Agent owning the blocker, if any
    pub blocker: Option<NetId>,
}

/// World query service injected into the action core.
pub trait SpatialQuery: Send + Sync {
    /// Sweeps a sphere of `radius` from `start` to `end` and returns the
    /// first blocking hit. Blockers owned by `ignore` are skipped.
    fn sweep_sphere(&self, start: Vec3, end: Vec3, radius: f32, ignore: Option<NetId>)
        -> Option<SweepHit>;
}

/// Spherical blocker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereObstacle {
    pub center: Vec3,
    pub radius: f32,
    pub owner: Option<NetId>,
}

/// Default [`SpatialQuery`]: a flat list of sphere obstacles.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<SphereObstacle>,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_obstacle(mut self, center: Vec3, radius: f32) -> Self {
        self.add(SphereObstacle {
            center,
            radius,
            owner: None,
        });
        self
    }

    pub fn add(&mut self, obstacle: SphereObstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl SpatialQuery for ObstacleField {
    fn sweep_sphere(
        &self,
        start: Vec3,
        end: Vec3,
        radius: f32,
        ignore: Option<NetId>,
    ) -> Option<SweepHit> {
        let segment = end - start;
        let length = segment.length();
        if length <= f32::EPSILON {
            return None;
        }
        let dir = segment / length;

        let mut best: Option<SweepHit> = None;
        for obstacle in &self.obstacles {
            if ignore.is_some() && obstacle.owner == ignore {
                continue;
            }
            // Sphere sweep against a sphere is a ray cast against the
            // obstacle inflated by the sweep radius
            let combined = obstacle.radius + radius.max(0.0);
            let Some(t) = ray_sphere(start, dir, obstacle.center, combined) else {
                continue;
            };
            if t > length {
                continue;
            }
            if best.is_some_and(|b| b.distance <= t) {
                continue;
            }

            let sweep_center = start + dir * t;
            let normal = (sweep_center - obstacle.center).try_normalize().unwrap_or(-dir);
            best = Some(SweepHit {
                impact_point: obstacle.center + normal * obstacle.radius,
                distance: t,
                blocker: obstacle.owner,
            });
        }
        best
    }
}

/// Distance along `dir` (unit) from `origin` to the first contact with the
/// sphere, or 0.0 when starting inside it.
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = offset.dot(dir);
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_field_never_hits() {
        let field = ObstacleField::new();
        assert!(field
            .sweep_sphere(Vec3::ZERO, Vec3::Z * 100.0, 5.0, None)
            .is_none());
    }

    #[test]
    fn test_hit_shortens_probe() {
        let field = ObstacleField::new().with_obstacle(Vec3::new(0.0, 0.0, 1000.0), 100.0);
        let hit = field
            .sweep_sphere(Vec3::ZERO, Vec3::Z * 5000.0, 20.0, None)
            .unwrap();

        // Contact when the swept sphere touches the inflated radius
        assert!((hit.distance - 880.0).abs() < 1e-2);
        assert!((hit.impact_point - Vec3::new(0.0, 0.0, 900.0)).length() < 1e-2);
    }

    #[test]
    fn test_out_of_range_obstacle_ignored() {
        let field = ObstacleField::new().with_obstacle(Vec3::new(0.0, 0.0, 6000.0), 100.0);
        assert!(field
            .sweep_sphere(Vec3::ZERO, Vec3::Z * 5000.0, 20.0, None)
            .is_none());
    }

    #[test]
    fn test_obstacle_behind_start_ignored() {
        let field = ObstacleField::new().with_obstacle(Vec3::new(0.0, 0.0, -500.0), 100.0);
        assert!(field
            .sweep_sphere(Vec3::ZERO, Vec3::Z * 5000.0, 20.0, None)
            .is_none());
    }

    #[test]
    fn test_nearest_hit_wins() {
        let field = ObstacleField::new()
            .with_obstacle(Vec3::new(0.0, 0.0, 3000.0), 50.0)
            .with_obstacle(Vec3::new(0.0, 0.0, 1000.0), 50.0);
        let hit = field
            .sweep_sphere(Vec3::ZERO, Vec3::Z * 5000.0, 0.0, None)
            .unwrap();
        assert!((hit.impact_point.z - 950.0).abs() < 1e-2);
    }

    #[test]
    fn test_ignored_owner() {
        let mut field = ObstacleField::new();
        field.add(SphereObstacle {
            center: Vec3::new(0.0, 0.0, 10.0),
            radius: 30.0,
            owner: Some(NetId(1)),
        });
        assert!(field
            .sweep_sphere(Vec3::ZERO, Vec3::Z * 100.0, 5.0, Some(NetId(1)))
            .is_none());
        let hit = field
            .sweep_sphere(Vec3::ZERO, Vec3::Z * 100.0, 5.0, Some(NetId(2)))
            .unwrap();
        assert_eq!(hit.blocker, Some(NetId(1)));
        assert_eq!(hit.distance, 0.0);
    }
}
