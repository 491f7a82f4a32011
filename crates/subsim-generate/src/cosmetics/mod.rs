//! Cosmetic entity attributes backed by the `fake` crate.
//!
//! These are independent draws with no cross-field logic; nothing in the
//! simulator depends on their values.

mod locales;

pub use locales::{LocaleKey, region_for};

use fake::Fake;
use fake::faker::address::raw::CityName;
use fake::faker::company::raw::{Bs, CompanyName};
use fake::faker::internet::raw::{Password, SafeEmail};
use fake::faker::lorem::raw::Word;
use fake::faker::name::raw::Name;
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::{EN, FR_FR};
use rand::Rng;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

const FEATURE_COUNT: usize = 3;

/// Contact and location fields for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
}

pub fn company_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    CompanyName(EN).fake_with_rng(rng)
}

/// Lowercase hex SHA-256 digest of a random password.
pub fn api_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    let password: String = Password(EN, 12..24).fake_with_rng(rng);
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn plan_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let phrase: String = Bs(EN).fake_with_rng(rng);
    title_case(&phrase)
}

/// Small feature blob: word keys mapped to a word or an integer.
pub fn features<R: Rng + ?Sized>(rng: &mut R) -> Map<String, Value> {
    let mut features = Map::new();
    while features.len() < FEATURE_COUNT {
        let mut key: String = Word(EN).fake_with_rng(rng);
        if features.contains_key(&key) {
            key = format!("{key}_{}", features.len());
        }
        let value = if rng.random_bool(0.5) {
            let word: String = Word(EN).fake_with_rng(rng);
            Value::String(word)
        } else {
            Value::from(rng.random_range(0..10_000_i64))
        };
        features.insert(key, value);
    }
    features
}

/// Expands to a `Contact` drawn from one concrete `fake` locale.
macro_rules! contact_in {
    ($locale:expr, $rng:expr) => {
        Contact {
            name: Name($locale).fake_with_rng($rng),
            email: SafeEmail($locale).fake_with_rng($rng),
            phone: PhoneNumber($locale).fake_with_rng($rng),
            city: CityName($locale).fake_with_rng($rng),
        }
    };
}

pub fn contact<R: Rng + ?Sized>(locale: LocaleKey, rng: &mut R) -> Contact {
    match locale {
        LocaleKey::En => contact_in!(EN, rng),
        LocaleKey::FrFr => contact_in!(FR_FR, rng),
    }
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn api_key_is_hex_digest() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let key = api_key(&mut rng);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn features_have_three_entries() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..20 {
            let blob = features(&mut rng);
            assert_eq!(blob.len(), FEATURE_COUNT);
            assert!(blob.values().all(|v| v.is_string() || v.is_i64()));
        }
    }

    #[test]
    fn title_case_capitalizes_words() {
        assert_eq!(title_case("seize viral  markets"), "Seize Viral Markets");
    }

    #[test]
    fn contact_is_deterministic_per_seed() {
        let a = contact(LocaleKey::FrFr, &mut ChaCha8Rng::seed_from_u64(4));
        let b = contact(LocaleKey::FrFr, &mut ChaCha8Rng::seed_from_u64(4));
        assert_eq!(a, b);
        assert!(!a.name.is_empty());
        assert!(a.email.contains('@'));
    }

    #[test]
    fn contact_fills_every_field_in_each_locale() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for locale in [LocaleKey::En, LocaleKey::FrFr] {
            let contact = contact(locale, &mut rng);
            assert!(!contact.name.is_empty());
            assert!(!contact.phone.is_empty());
            assert!(!contact.city.is_empty());
            assert!(contact.email.contains('@'));
        }
    }
}
