// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin credential resolution: fixed values from configuration, or freshly
//! generated ones.

use rand::seq::SliceRandom;
use rand::Rng;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
/// Symbols a generated password may contain.
pub const SYMBOLS: &[u8] = b"!@#$%^&*";

/// Shortest password the generator will produce.
pub const MIN_PASSWORD_LENGTH: usize = 12;
/// Length of the random part of a generated email's local part.
pub const EMAIL_SUFFIX_LENGTH: usize = 6;
/// Display name used for generated credentials.
pub const GENERATED_DISPLAY_NAME: &str = "Admin";

/// Email, password and display name for the admin account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Where credentials come from.
#[derive(Debug, Clone)]
pub enum CredentialResolver {
    /// Operator-supplied values, used as is.
    Fixed(Credentials),
    /// Random email under `domain` and a random password of `password_length`.
    Generated {
        domain: String,
        password_length: usize,
    },
}

impl CredentialResolver {
    /// Generator with the default password length.
    pub fn generated(domain: &str) -> Self {
        Self::Generated {
            domain: domain.to_string(),
            password_length: MIN_PASSWORD_LENGTH,
        }
    }

    /// Resolve credentials using the thread-local RNG.
    pub fn resolve(&self) -> Credentials {
        self.resolve_with(&mut rand::thread_rng())
    }

    /// Resolve credentials with an explicit RNG.
    pub fn resolve_with<R: Rng>(&self, rng: &mut R) -> Credentials {
        match self {
            CredentialResolver::Fixed(credentials) => credentials.clone(),
            CredentialResolver::Generated {
                domain,
                password_length,
            } => Credentials {
                email: generate_email(rng, domain),
                password: generate_password(rng, *password_length),
                display_name: GENERATED_DISPLAY_NAME.to_string(),
            },
        }
    }
}

/// `admin-<6 lowercase alphanumerics>@<domain>`.
pub fn generate_email<R: Rng>(rng: &mut R, domain: &str) -> String {
    let alphabet: Vec<u8> = [LOWERCASE, DIGITS].concat();
    let suffix: String = (0..EMAIL_SUFFIX_LENGTH)
        .map(|_| pick(rng, &alphabet))
        .collect();
    format!("admin-{}@{}", suffix, domain)
}

/// Random password with at least one character from each class.
///
/// Lengths below [`MIN_PASSWORD_LENGTH`] are raised to it.
pub fn generate_password<R: Rng>(rng: &mut R, length: usize) -> String {
    let length = length.max(MIN_PASSWORD_LENGTH);
    let classes = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS];

    let mut chars: Vec<char> = Vec::with_capacity(length);
    for class in classes {
        chars.push(pick(rng, class));
    }

    let all: Vec<u8> = classes.concat();
    while chars.len() < length {
        chars.push(pick(rng, &all));
    }

    // Required characters were placed first; shuffle so they can land anywhere.
    chars.shuffle(rng);
    chars.into_iter().collect()
}

fn pick<R: Rng>(rng: &mut R, alphabet: &[u8]) -> char {
    alphabet[rng.gen_range(0..alphabet.len())] as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_password_rules(password: &str, length: usize) {
        assert_eq!(password.len(), length, "password {:?}", password);
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_lowercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.bytes().any(|b| SYMBOLS.contains(&b)));
        assert!(password
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || SYMBOLS.contains(&b)));
    }

    #[test]
    fn test_generated_passwords_follow_composition_rules() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert_password_rules(&generate_password(&mut rng, 12), 12);
        }
        for _ in 0..100 {
            assert_password_rules(&generate_password(&mut rng, 20), 20);
        }
    }

    #[test]
    fn test_short_lengths_are_raised_to_minimum() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_password_rules(&generate_password(&mut rng, 4), MIN_PASSWORD_LENGTH);
    }

    #[test]
    fn test_required_characters_are_not_always_in_front() {
        let mut rng = StdRng::seed_from_u64(42);
        let upper_first = (0..200)
            .filter(|_| {
                generate_password(&mut rng, 12)
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_uppercase())
            })
            .count();
        assert!(upper_first < 200, "shuffle should move the uppercase seed");
    }

    #[test]
    fn test_generated_email_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let email = generate_email(&mut rng, "example.org");
            let local = email
                .strip_prefix("admin-")
                .and_then(|rest| rest.strip_suffix("@example.org"))
                .expect("admin-<suffix>@example.org");
            assert_eq!(local.len(), EMAIL_SUFFIX_LENGTH);
            assert!(local
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_fixed_credentials_pass_through() {
        let fixed = Credentials {
            email: "ops@example.com".to_string(),
            password: "Correct-Horse-9".to_string(),
            display_name: "Ops".to_string(),
        };
        let resolved = CredentialResolver::Fixed(fixed.clone()).resolve();
        assert_eq!(resolved, fixed);
    }

    #[test]
    fn test_debug_output_redacts_password() {
        let creds = CredentialResolver::generated("example.com").resolve();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains(&creds.password));
        assert!(debug.contains("<redacted>"));
    }
}
