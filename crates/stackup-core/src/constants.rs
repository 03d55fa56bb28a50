//! Constantes del motor core.
//!
//! Agrupa valores estáticos que participan en el hash de la definición del
//! workflow y las claves del documento de configuración persistido. Cambiar
//! una clave rompe la lectura de configuraciones ya guardadas en disco.

/// Versión lógica del motor. Forma parte del `definition_hash` para que un
/// cambio incompatible del engine sea visible en el journal aunque la lista de
/// steps no cambie.
pub const ENGINE_VERSION: &str = "S1.0";

/// Longitud de los secretos generados aleatoriamente.
pub const GENERATED_SECRET_LEN: usize = 20;

pub const KEY_MGMT_ADDRESS: &str = "STACKUP_MGMT_ADDRESS";
pub const KEY_PROVIDER_INTERFACE: &str = "STACKUP_PROVIDER_INTERFACE";
pub const KEY_ADMIN_PASSWORD: &str = "STACKUP_ADMIN_PASSWORD";
pub const KEY_DEMO_PASSWORD: &str = "STACKUP_DEMO_PASSWORD";
pub const KEY_DB_ROOT_PASSWORD: &str = "STACKUP_DB_ROOT_PASSWORD";
pub const KEY_BROKER_PASSWORD: &str = "STACKUP_BROKER_PASSWORD";
pub const KEY_SERVICE_PASSWORD: &str = "STACKUP_SERVICE_PASSWORD";
pub const KEY_METADATA_SECRET: &str = "STACKUP_METADATA_SECRET";
