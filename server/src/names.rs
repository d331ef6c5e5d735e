use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const ADJECTIVES: [&str; 16] = [
    "Swift", "Silent", "Crimson", "Lucky", "Brave", "Frosty", "Rusty", "Nimble", "Solar",
    "Gloomy", "Jolly", "Stellar", "Wild", "Cosmic", "Quiet", "Fierce",
];

const NOUNS: [&str; 16] = [
    "Otter", "Falcon", "Comet", "Badger", "Nebula", "Lynx", "Pilot", "Raven", "Quasar", "Mantis",
    "Walrus", "Drifter", "Heron", "Meteor", "Panda", "Viper",
];

/// Source of display identities for newly connected players.
pub trait NameGenerator: Send + Sync {
    fn username(&mut self) -> String;
    fn color(&mut self) -> String;
}

/// Adjective + noun names and random 24-bit colours.
pub struct RandomNames {
    rng: StdRng,
}

impl RandomNames {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomNames {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGenerator for RandomNames {
    fn username(&mut self) -> String {
        let adjective = ADJECTIVES.choose(&mut self.rng).copied().unwrap_or("Lone");
        let noun = NOUNS.choose(&mut self.rng).copied().unwrap_or("Pilot");
        format!("{}{}", adjective, noun)
    }

    fn color(&mut self) -> String {
        format!("#{:06x}", self.rng.gen_range(0..=0xFF_FFFFu32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_format() {
        let mut names = RandomNames::seeded(1);
        for _ in 0..50 {
            let color = names.color();
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(u32::from_str_radix(&color[1..], 16).is_ok());
        }
    }

    #[test]
    fn test_username_from_word_lists() {
        let mut names = RandomNames::seeded(2);
        let username = names.username();
        assert!(ADJECTIVES.iter().any(|a| username.starts_with(a)));
        assert!(NOUNS.iter().any(|n| username.ends_with(n)));
    }

    #[test]
    fn test_seeded_is_repeatable() {
        let mut a = RandomNames::seeded(99);
        let mut b = RandomNames::seeded(99);
        assert_eq!(a.username(), b.username());
        assert_eq!(a.color(), b.color());
    }
}
