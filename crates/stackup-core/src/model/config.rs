//! `RunConfiguration`: todos los inputs que necesitan los bodies de los steps.
//!
//! Se crea una única vez (recolección interactiva en el primer run), se
//! persiste y a partir de ahí se carga tal cual en cada invocación. No expone
//! setters: el engine sólo recibe `&RunConfiguration`.
//!
//! La representación textual es una lista de pares `CLAVE=valor` (ver
//! `to_pairs`/`from_pairs`); el formato del fichero lo decide el store.

use std::collections::HashMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::Secret;
use crate::constants::*;
use crate::errors::ConfigFormatError;
use crate::hashing::{hash_str, hash_value};

/// Conjunto de credenciales del run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secrets {
    pub admin_password: Secret,
    pub demo_password: Secret,
    pub db_root_password: Secret,
    pub broker_password: Secret,
    pub service_password: Secret,
    /// Secreto compartido del proxy de metadata; siempre generado.
    pub metadata_secret: Secret,
}

impl Secrets {
    /// Genera todas las credenciales de forma aleatoria.
    pub fn generate() -> Self {
        let gen = || Secret::generate(GENERATED_SECRET_LEN);
        Self { admin_password: gen(),
               demo_password: gen(),
               db_root_password: gen(),
               broker_password: gen(),
               service_password: gen(),
               metadata_secret: gen() }
    }

    /// Sustituye la contraseña de administración por una elegida por el operador.
    pub fn with_admin_password(mut self, password: Secret) -> Self {
        self.admin_password = password;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfiguration {
    management_address: IpAddr,
    provider_interface: String,
    secrets: Secrets,
}

impl RunConfiguration {
    pub fn new(management_address: IpAddr, provider_interface: impl Into<String>, secrets: Secrets) -> Self {
        Self { management_address,
               provider_interface: provider_interface.into(),
               secrets }
    }

    pub fn management_address(&self) -> IpAddr {
        self.management_address
    }

    /// Dirección de gestión lista para usarse dentro de una URL
    /// (IPv6 entre corchetes).
    pub fn management_host(&self) -> String {
        match self.management_address {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{v6}]"),
        }
    }

    pub fn provider_interface(&self) -> &str {
        &self.provider_interface
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    /// Fingerprint estable de la configuración. Los secretos entran hasheados,
    /// así el fingerprint puede aparecer en logs y en el journal.
    pub fn fingerprint(&self) -> String {
        let s = &self.secrets;
        hash_value(&json!({
            "management_address": self.management_address.to_string(),
            "provider_interface": self.provider_interface,
            "secrets": [
                hash_str(s.admin_password.expose()),
                hash_str(s.demo_password.expose()),
                hash_str(s.db_root_password.expose()),
                hash_str(s.broker_password.expose()),
                hash_str(s.service_password.expose()),
                hash_str(s.metadata_secret.expose()),
            ],
        }))
    }

    /// Pares clave/valor en orden estable para persistir.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let s = &self.secrets;
        vec![(KEY_MGMT_ADDRESS, self.management_address.to_string()),
             (KEY_PROVIDER_INTERFACE, self.provider_interface.clone()),
             (KEY_ADMIN_PASSWORD, s.admin_password.expose().to_string()),
             (KEY_DEMO_PASSWORD, s.demo_password.expose().to_string()),
             (KEY_DB_ROOT_PASSWORD, s.db_root_password.expose().to_string()),
             (KEY_BROKER_PASSWORD, s.broker_password.expose().to_string()),
             (KEY_SERVICE_PASSWORD, s.service_password.expose().to_string()),
             (KEY_METADATA_SECRET, s.metadata_secret.expose().to_string())]
    }

    /// Reconstruye la configuración a partir de pares clave/valor. Las claves
    /// desconocidas se ignoran; una clave requerida ausente o vacía hace que el
    /// documento no esté bien formado.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigFormatError>
        where I: IntoIterator<Item = (String, String)>
    {
        let map: HashMap<String, String> = pairs.into_iter().collect();
        let get = |key: &'static str| -> Result<String, ConfigFormatError> {
            let v = map.get(key).ok_or(ConfigFormatError::MissingKey(key))?;
            if v.trim().is_empty() {
                return Err(ConfigFormatError::EmptyValue(key));
            }
            Ok(v.clone())
        };
        let secret = |key: &'static str| get(key).map(Secret::new);

        let raw_addr = get(KEY_MGMT_ADDRESS)?;
        let management_address = raw_addr.trim()
                                         .parse::<IpAddr>()
                                         .map_err(|_| ConfigFormatError::InvalidAddress(raw_addr.clone()))?;
        let secrets = Secrets { admin_password: secret(KEY_ADMIN_PASSWORD)?,
                                demo_password: secret(KEY_DEMO_PASSWORD)?,
                                db_root_password: secret(KEY_DB_ROOT_PASSWORD)?,
                                broker_password: secret(KEY_BROKER_PASSWORD)?,
                                service_password: secret(KEY_SERVICE_PASSWORD)?,
                                metadata_secret: secret(KEY_METADATA_SECRET)? };
        Ok(Self { management_address,
                  provider_interface: get(KEY_PROVIDER_INTERFACE)?,
                  secrets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunConfiguration {
        RunConfiguration::new("10.0.0.11".parse().unwrap(), "eth1", Secrets::generate())
    }

    #[test]
    fn pairs_rebuild_identical_configuration() {
        let cfg = sample();
        let pairs = cfg.to_pairs().into_iter().map(|(k, v)| (k.to_string(), v));
        let back = RunConfiguration::from_pairs(pairs).expect("well formed");
        assert_eq!(back, cfg);
        assert_eq!(back.fingerprint(), cfg.fingerprint());
    }

    #[test]
    fn missing_key_is_reported() {
        let pairs: Vec<(String, String)> = sample().to_pairs()
                                                   .into_iter()
                                                   .filter(|(k, _)| *k != KEY_BROKER_PASSWORD)
                                                   .map(|(k, v)| (k.to_string(), v))
                                                   .collect();
        assert_eq!(RunConfiguration::from_pairs(pairs),
                   Err(ConfigFormatError::MissingKey(KEY_BROKER_PASSWORD)));
    }

    #[test]
    fn malformed_address_is_rejected() {
        let pairs: Vec<(String, String)> = sample().to_pairs()
                                                   .into_iter()
                                                   .map(|(k, v)| {
                                                       if k == KEY_MGMT_ADDRESS {
                                                           (k.to_string(), "10.0.0.300".to_string())
                                                       } else {
                                                           (k.to_string(), v)
                                                       }
                                                   })
                                                   .collect();
        assert!(matches!(RunConfiguration::from_pairs(pairs), Err(ConfigFormatError::InvalidAddress(_))));
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        let cfg = RunConfiguration::new("fd00::11".parse().unwrap(), "eth1", Secrets::generate());
        assert_eq!(cfg.management_host(), "[fd00::11]");
    }

    #[test]
    fn fingerprint_changes_with_secrets() {
        let a = sample();
        let b = RunConfiguration::new(a.management_address(), "eth1", Secrets::generate());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
