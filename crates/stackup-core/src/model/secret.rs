//! `Secret`: credencial en claro con `Debug`/`Display` redactados.
//!
//! El valor sólo sale por `expose()`, de modo que un `{:?}` de la
//! configuración en un log no filtra contraseñas.

use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

const REDACTED: &str = "******";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Secreto alfanumérico aleatorio de `len` caracteres.
    pub fn generate(len: usize) -> Self {
        let value: String = rand::thread_rng().sample_iter(&Alphanumeric)
                                              .take(len)
                                              .map(char::from)
                                              .collect();
        Self(value)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({REDACTED})")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_do_not_leak() {
        let s = Secret::new("hunter2");
        assert!(!format!("{s:?}").contains("hunter2"));
        assert_eq!(s.to_string(), "******");
        assert_eq!(s.expose(), "hunter2");
    }

    #[test]
    fn generated_secrets_are_alphanumeric_and_distinct() {
        let a = Secret::generate(20);
        let b = Secret::generate(20);
        assert_eq!(a.expose().len(), 20);
        assert!(a.expose().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
