use rand::Rng;
use shared::{AmmoBoostSnapshot, GameConfiguration, Vector2, AMMO_BOOST_RADIUS};

/// Static pickup that refills a ship's ammunition on first contact.
#[derive(Debug, Clone, PartialEq)]
pub struct AmmoBoost {
    pub id: u32,
    pub absolute_position: Vector2,
}

impl AmmoBoost {
    pub fn new(id: u32, absolute_position: Vector2) -> Self {
        Self {
            id,
            absolute_position,
        }
    }

    /// Places a boost uniformly at random inside the world rectangle.
    ///
    /// A degenerate axis (zero, negative or non-finite extent) pins the
    /// boost to 0 on that axis.
    pub fn scattered<R: Rng>(id: u32, config: &GameConfiguration, rng: &mut R) -> Self {
        let x = along_axis(rng, config.width);
        let y = along_axis(rng, config.height);
        Self::new(id, Vector2::new(x, y))
    }

    pub fn radius(&self) -> f32 {
        AMMO_BOOST_RADIUS
    }

    pub fn snapshot(&self) -> AmmoBoostSnapshot {
        AmmoBoostSnapshot {
            id: self.id,
            absolute_position: self.absolute_position,
            radius: AMMO_BOOST_RADIUS,
        }
    }
}

fn along_axis<R: Rng>(rng: &mut R, extent: f32) -> f32 {
    if extent.is_finite() && extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_scattered_inside_world() {
        let config = GameConfiguration::default();
        let mut rng = StdRng::seed_from_u64(42);
        for id in 0..200 {
            let boost = AmmoBoost::scattered(id, &config, &mut rng);
            assert!(boost.absolute_position.x >= 0.0 && boost.absolute_position.x < config.width);
            assert!(boost.absolute_position.y >= 0.0 && boost.absolute_position.y < config.height);
        }
    }

    #[test]
    fn test_scattered_is_deterministic_for_seed() {
        let config = GameConfiguration::default();
        let a = AmmoBoost::scattered(1, &config, &mut StdRng::seed_from_u64(7));
        let b = AmmoBoost::scattered(1, &config, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_scattered_degenerate_world() {
        let mut rng = StdRng::seed_from_u64(3);
        for (width, height) in [(0.0, 100.0), (-5.0, f32::NAN), (f32::INFINITY, 0.0)] {
            let config = GameConfiguration {
                width,
                height,
                ..Default::default()
            };
            let boost = AmmoBoost::scattered(0, &config, &mut rng);
            assert_eq!(boost.absolute_position.x, 0.0);
            assert!(boost.absolute_position.y >= 0.0);
        }
    }
}
