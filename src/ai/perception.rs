//! Target detection scoring
//!
//! Computes a 0-100 chance that an observer notices a candidate target this
//! tick, from weighted sight and hearing contributions attenuated by the
//! field of view. The random draw is injected so simulations stay
//! deterministic under a seeded RNG.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::world::Pose;

#[inline]
fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Tuning for one agent's senses.
///
/// Sight and hearing weights always sum to 100: only the sight weight is
/// stored, and the hearing weight is derived, so no rebalancing step can
/// break the invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// Share of the detection score contributed by sight, 0-100
    sight_weight: f32,
    /// Distance at which the sight contribution decays to zero
    pub max_sight_distance: f32,
    /// Distance at which the hearing contribution decays to zero
    pub max_hearing_distance: f32,
    /// Target speed at which movement noise saturates
    pub max_speed_for_hearing: f32,
    /// Field-of-view half-angle in degrees
    pub fov_half_angle: f32,
    /// Baseline detection chance, 0-100, before sensory attenuation
    pub base_chance: f32,
    /// Distance within which an acquired target can be attacked
    pub attack_range: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            sight_weight: 70.0,
            max_sight_distance: 15.0,
            max_hearing_distance: 8.0,
            max_speed_for_hearing: 6.0,
            fov_half_angle: 60.0,
            base_chance: 50.0,
            attack_range: 1.5,
        }
    }
}

impl PerceptionConfig {
    /// Sight share of the detection score, 0-100
    #[must_use]
    pub fn sight_weight(&self) -> f32 {
        self.sight_weight
    }

    /// Hearing share of the detection score, 0-100
    #[must_use]
    pub fn hearing_weight(&self) -> f32 {
        100.0 - self.sight_weight
    }

    /// Set the sight weight; hearing becomes the complement
    pub fn set_sight_weight(&mut self, weight: f32) {
        self.sight_weight = weight.clamp(0.0, 100.0);
    }

    /// Set the hearing weight; sight becomes the complement
    pub fn set_hearing_weight(&mut self, weight: f32) {
        self.sight_weight = 100.0 - weight.clamp(0.0, 100.0);
    }

    /// Longest distance at which either sense can contribute
    #[must_use]
    pub fn max_range(&self) -> f32 {
        self.max_sight_distance.max(self.max_hearing_distance)
    }

    /// Detection chance in `[0, 100]` for a target at `target_position`
    /// moving with `target_velocity`.
    ///
    /// A zero or negative range disables that sense rather than dividing by
    /// zero; a zero field of view makes the observer effectively blind to
    /// everything off its exact facing.
    #[must_use]
    pub fn detection_chance(
        &self,
        observer: &Pose,
        target_position: Vec3,
        target_velocity: Vec3,
    ) -> f32 {
        let distance = observer.position.distance(target_position);

        let sight = if self.max_sight_distance > 0.0 {
            clamp01(1.0 - distance / self.max_sight_distance)
        } else {
            0.0
        };

        let mut hearing = if self.max_hearing_distance > 0.0 {
            clamp01(1.0 - distance / self.max_hearing_distance)
        } else {
            0.0
        };
        if hearing > 0.0 {
            // Movement audibility: a faster target is easier to hear
            hearing *= if self.max_speed_for_hearing > 0.0 {
                clamp01(target_velocity.length() / self.max_speed_for_hearing)
            } else {
                0.0
            };
        }

        let angle = self.angle_factor(observer, target_position);

        let weighted =
            (self.sight_weight() * sight + self.hearing_weight() * hearing) / 100.0;
        (self.base_chance * weighted * angle).clamp(0.0, 100.0)
    }

    /// Roll detection: a uniform draw in `[0, 100)` below the chance
    pub fn detect<R: Rng>(
        &self,
        observer: &Pose,
        target_position: Vec3,
        target_velocity: Vec3,
        rng: &mut R,
    ) -> bool {
        let chance = self.detection_chance(observer, target_position, target_velocity);
        if chance <= 0.0 {
            return false;
        }
        rng.gen_range(0.0..100.0) < chance
    }

    /// How directly the observer faces the target, 1 dead ahead, falling off
    /// linearly to 0 at the field-of-view half-angle
    fn angle_factor(&self, observer: &Pose, target_position: Vec3) -> f32 {
        if self.fov_half_angle <= 0.0 {
            return 0.0;
        }
        let to_target = target_position - observer.position;
        let flat = Vec3::new(to_target.x, 0.0, to_target.z);
        if flat.length_squared() < 1e-8 {
            // Target on top of the observer
            return 1.0;
        }
        let cos = observer.facing.dot(flat.normalize()).clamp(-1.0, 1.0);
        let angle_deg = cos.acos().to_degrees();
        clamp01(1.0 - angle_deg / self.fov_half_angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn observer_at_origin() -> Pose {
        Pose::new(Vec3::ZERO, Vec3::Z)
    }

    #[test]
    fn test_weights_always_sum_to_hundred() {
        let mut config = PerceptionConfig::default();
        for weight in [-50.0, 0.0, 13.7, 100.0, 250.0] {
            config.set_sight_weight(weight);
            assert!((config.sight_weight() + config.hearing_weight() - 100.0).abs() < 1e-6);

            config.set_hearing_weight(weight);
            assert!((config.sight_weight() + config.hearing_weight() - 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rebalancing_adjusts_the_other_channel() {
        let mut config = PerceptionConfig::default();
        config.set_sight_weight(30.0);
        assert!((config.hearing_weight() - 70.0).abs() < 1e-6);

        config.set_hearing_weight(10.0);
        assert!((config.sight_weight() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_pure_sight_at_half_range() {
        // Dead ahead at half the sight range: chance = base * 0.5
        let mut config = PerceptionConfig {
            max_sight_distance: 10.0,
            fov_half_angle: 60.0,
            base_chance: 80.0,
            ..Default::default()
        };
        config.set_sight_weight(100.0);

        let chance = config.detection_chance(
            &observer_at_origin(),
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
        );
        assert!((chance - 80.0 * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_chance_is_clamped() {
        let mut config = PerceptionConfig {
            base_chance: 100_000.0,
            max_sight_distance: 100.0,
            ..Default::default()
        };
        config.set_sight_weight(100.0);

        let chance = config.detection_chance(
            &observer_at_origin(),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::ZERO,
        );
        assert!((0.0..=100.0).contains(&chance));
        assert_eq!(chance, 100.0);
    }

    #[test]
    fn test_zero_ranges_never_divide() {
        let config = PerceptionConfig {
            max_sight_distance: 0.0,
            max_hearing_distance: 0.0,
            max_speed_for_hearing: 0.0,
            ..Default::default()
        };
        let chance = config.detection_chance(
            &observer_at_origin(),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(3.0, 0.0, 0.0),
        );
        assert_eq!(chance, 0.0);
    }

    #[test]
    fn test_out_of_range_target_scores_zero() {
        let config = PerceptionConfig::default();
        let far = Vec3::new(0.0, 0.0, config.max_range() + 1.0);
        assert_eq!(
            config.detection_chance(&observer_at_origin(), far, Vec3::ZERO),
            0.0
        );
    }

    #[test]
    fn test_angle_factor_decays_to_fov_edge() {
        let mut config = PerceptionConfig {
            max_sight_distance: 100.0,
            fov_half_angle: 60.0,
            base_chance: 100.0,
            ..Default::default()
        };
        config.set_sight_weight(100.0);
        let observer = observer_at_origin();

        let ahead = config.detection_chance(&observer, Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        // 45 degrees off facing
        let offset = config.detection_chance(
            &observer,
            Vec3::new(5.0f32 / 2.0f32.sqrt(), 0.0, 5.0f32 / 2.0f32.sqrt()),
            Vec3::ZERO,
        );
        // Behind the observer
        let behind = config.detection_chance(&observer, Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO);

        assert!(ahead > offset);
        assert!(offset > 0.0);
        assert_eq!(behind, 0.0);
    }

    #[test]
    fn test_faster_target_is_easier_to_hear() {
        let mut config = PerceptionConfig {
            max_hearing_distance: 10.0,
            max_speed_for_hearing: 6.0,
            fov_half_angle: 90.0,
            base_chance: 100.0,
            ..Default::default()
        };
        config.set_hearing_weight(100.0);
        let observer = observer_at_origin();
        let position = Vec3::new(0.0, 0.0, 5.0);

        let still = config.detection_chance(&observer, position, Vec3::ZERO);
        let slow = config.detection_chance(&observer, position, Vec3::new(0.0, 0.0, 2.0));
        let fast = config.detection_chance(&observer, position, Vec3::new(0.0, 0.0, 6.0));

        assert_eq!(still, 0.0);
        assert!(slow > still);
        assert!(fast > slow);
    }

    #[test]
    fn test_detect_is_deterministic_under_seed() {
        let config = PerceptionConfig::default();
        let observer = observer_at_origin();
        let position = Vec3::new(0.0, 0.0, 3.0);

        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..64 {
            assert_eq!(
                config.detect(&observer, position, Vec3::ZERO, &mut a),
                config.detect(&observer, position, Vec3::ZERO, &mut b)
            );
        }
    }

    #[test]
    fn test_zero_chance_never_consumes_randomness() {
        let config = PerceptionConfig {
            base_chance: 0.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let before = rng.clone();
        assert!(!config.detect(
            &observer_at_origin(),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::ZERO,
            &mut rng
        ));
        assert_eq!(rng.get_word_pos(), before.get_word_pos());
    }
}
