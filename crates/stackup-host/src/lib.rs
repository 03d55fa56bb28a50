//! stackup-host: todo lo que toca el host.
//!
//! - `runner`: frontera de comandos externos (`CommandRunner`), con una
//!   implementación real y una guionizada para tests.
//! - `ops`: operaciones check-then-act (`HostOps`) que devuelven `Change`.
//! - `probe`: sondas de interfaces, memoria, disco y usuario.
//! - `steps`: el conjunto de referencia de steps concretos.
pub mod error;
pub mod ini;
pub mod ops;
pub mod probe;
pub mod runner;
pub mod steps;

pub use error::HostError;
pub use ops::{Change, HostOps};
pub use probe::{check_preconditions, HostProbe, InterfaceInfo, InterfaceSource, PreconditionWarning, StaticInterfaces, SystemInterfaces};
pub use runner::{CommandOutput, CommandRunner, HostCommand, ScriptedRunner, SystemCommandRunner};
pub use steps::{reference_workflow, service_endpoints, ChangeLog, HostStep};
