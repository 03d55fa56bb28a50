//! `HostOps`: operaciones de host con disciplina check-then-act.
//!
//! Cada `ensure_*` consulta primero el estado actual y sólo emite el comando
//! mutante si hace falta, devolviendo `Change::Unchanged` cuando el host ya
//! estaba como se pedía. Así un body interrumpido a medias puede volver a
//! ejecutarse desde el principio.
//!
//! Las rutas de ficheros de configuración son absolutas del host y se
//! resuelven bajo `root` (`/` en producción, un tempdir en tests).

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info};
use stackup_core::{RunConfiguration, Secret};
use tempfile::NamedTempFile;

use crate::error::HostError;
use crate::ini::IniDocument;
use crate::runner::{CommandOutput, CommandRunner, HostCommand};

pub const REGION: &str = "RegionOne";
pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PROJECT: &str = "admin";

/// (sección, clave, valor) para `ensure_ini_values`.
pub type IniSetting = (&'static str, &'static str, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

impl Change {
    pub fn is_applied(self) -> bool {
        self == Change::Applied
    }

    /// `Applied` si alguno lo es.
    pub fn merge(self, other: Change) -> Change {
        if self.is_applied() || other.is_applied() {
            Change::Applied
        } else {
            Change::Unchanged
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Change::Applied => "applied",
            Change::Unchanged => "unchanged",
        }
    }
}

impl From<bool> for Change {
    fn from(changed: bool) -> Self {
        if changed {
            Change::Applied
        } else {
            Change::Unchanged
        }
    }
}

pub struct HostOps {
    runner: Rc<dyn CommandRunner>,
    root: PathBuf,
}

impl HostOps {
    pub fn new(runner: Rc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self { runner,
               root: root.into() }
    }

    /// Ruta absoluta del host resuelta bajo `root`.
    pub fn host_path(&self, abs: &str) -> PathBuf {
        self.root.join(abs.trim_start_matches('/'))
    }

    // ---- comandos ----

    /// Ejecuta y falla si el código de salida no es cero.
    pub fn exec(&self, cmd: HostCommand) -> Result<CommandOutput, HostError> {
        let out = self.runner.run(&cmd)?;
        if !out.success() {
            return Err(HostError::NonZero { command: cmd.to_string(),
                                            status: out.status_label(),
                                            stderr: out.stderr });
        }
        Ok(out)
    }

    /// Consulta booleana: código cero = verdadero. Sólo los errores de
    /// arranque del proceso se propagan.
    pub fn check(&self, cmd: HostCommand) -> Result<bool, HostError> {
        Ok(self.runner.run(&cmd)?.success())
    }

    /// Ejecuta y devuelve stdout recortado.
    pub fn query(&self, cmd: HostCommand) -> Result<String, HostError> {
        Ok(self.exec(cmd)?.stdout.trim().to_string())
    }

    // ---- paquetes y servicios ----

    pub fn ensure_packages(&self, packages: &[&str]) -> Result<Change, HostError> {
        let mut missing = Vec::new();
        for pkg in packages {
            let out = self.runner.run(&HostCommand::new("dpkg-query").args(["-W", "-f=${Status}", pkg]))?;
            if !(out.success() && out.stdout.contains("install ok installed")) {
                missing.push(*pkg);
            }
        }
        if missing.is_empty() {
            return Ok(Change::Unchanged);
        }
        info!("installing packages: {}", missing.join(" "));
        self.exec(HostCommand::new("apt-get").args(["install", "-y", "--no-install-recommends"])
                                             .args(missing)
                                             .env("DEBIAN_FRONTEND", "noninteractive")
                                             .mutating())?;
        Ok(Change::Applied)
    }

    pub fn ensure_service_enabled(&self, service: &str) -> Result<Change, HostError> {
        let enabled = self.check(HostCommand::new("systemctl").args(["is-enabled", "--quiet", service]))?;
        let active = self.check(HostCommand::new("systemctl").args(["is-active", "--quiet", service]))?;
        if enabled && active {
            return Ok(Change::Unchanged);
        }
        self.exec(HostCommand::new("systemctl").args(["enable", "--now", service]).mutating())?;
        Ok(Change::Applied)
    }

    pub fn restart_services(&self, services: &[&str]) -> Result<(), HostError> {
        for svc in services {
            self.exec(HostCommand::new("systemctl").args(["restart", svc]).mutating())?;
        }
        Ok(())
    }

    /// Reinicia `services` sólo si `change` indica que su configuración cambió.
    pub fn restart_if(&self, change: Change, services: &[&str]) -> Result<(), HostError> {
        if change.is_applied() {
            self.restart_services(services)?;
        }
        Ok(())
    }

    // ---- ficheros ----

    fn read_optional(&self, path: &Path) -> Result<Option<String>, HostError> {
        match fs::read_to_string(path) {
            Ok(c) => Ok(Some(c)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HostError::io(path, e)),
        }
    }

    fn write_atomic(&self, path: &Path, content: &str, mode: Option<u32>) -> Result<(), HostError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| HostError::io(dir, e))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| HostError::io(dir, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::{fchown, MetadataExt, PermissionsExt};
            let existing = fs::metadata(path).ok();
            let mode = match (mode, &existing) {
                (Some(m), _) => m,
                (None, Some(meta)) => meta.permissions().mode(),
                (None, None) => 0o644,
            };
            // los .conf empaquetados son root:<servicio>; el reemplazo conserva dueño y grupo
            if let Some(meta) = &existing {
                fchown(tmp.as_file(), Some(meta.uid()), Some(meta.gid())).map_err(|e| HostError::io(path, e))?;
            }
            tmp.as_file()
               .set_permissions(fs::Permissions::from_mode(mode))
               .map_err(|e| HostError::io(path, e))?;
        }
        #[cfg(not(unix))]
        let _ = mode;
        tmp.write_all(content.as_bytes()).map_err(|e| HostError::io(path, e))?;
        tmp.as_file().sync_all().map_err(|e| HostError::io(path, e))?;
        tmp.persist(path).map_err(|e| HostError::io(path, e.error))?;
        Ok(())
    }

    /// Aplica todos los `settings` a un fichero INI y lo reescribe sólo si
    /// alguno cambió.
    pub fn ensure_ini_values(&self, path: &str, settings: &[IniSetting]) -> Result<Change, HostError> {
        let full = self.host_path(path);
        let mut doc = IniDocument::parse(&self.read_optional(&full)?.unwrap_or_default());
        let mut changed = false;
        for (section, key, value) in settings {
            changed |= doc.set(section, key, value);
        }
        if changed {
            debug!("updating {path}");
            self.write_atomic(&full, &doc.render(), None)?;
        }
        Ok(changed.into())
    }

    /// Sustituye la primera línea que empieza por `prefix` por `line`, o la
    /// añade al final si no hay ninguna.
    pub fn ensure_line(&self, path: &str, prefix: &str, line: &str) -> Result<Change, HostError> {
        let full = self.host_path(path);
        let content = self.read_optional(&full)?.unwrap_or_default();
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        match lines.iter().position(|l| l.starts_with(prefix)) {
            Some(i) if lines[i] == line => return Ok(Change::Unchanged),
            Some(i) => lines[i] = line.to_string(),
            None => lines.push(line.to_string()),
        }
        let mut out = lines.join("\n");
        out.push('\n');
        self.write_atomic(&full, &out, None)?;
        Ok(Change::Applied)
    }

    /// Escribe el fichero completo si su contenido difiere.
    pub fn ensure_file(&self, path: &str, content: &str, mode: u32) -> Result<Change, HostError> {
        let full = self.host_path(path);
        if self.read_optional(&full)?.as_deref() == Some(content) {
            return Ok(Change::Unchanged);
        }
        self.write_atomic(&full, content, Some(mode))?;
        Ok(Change::Applied)
    }

    pub fn path_exists(&self, path: &str) -> bool {
        self.host_path(path).exists()
    }

    // ---- base de datos ----

    fn mysql(&self, sql: &str) -> HostCommand {
        HostCommand::new("mysql").args(["-N", "-B"]).stdin(sql)
    }

    pub fn sql_query(&self, sql: &str) -> Result<String, HostError> {
        self.query(self.mysql(sql))
    }

    pub fn ensure_db_root_password(&self, password: &Secret) -> Result<Change, HostError> {
        let pw = sql_quote(password.expose());
        let current = self.sql_query(&format!("SELECT COUNT(*) FROM mysql.user WHERE User='root' AND Host='localhost' \
                                               AND authentication_string=PASSWORD('{pw}');"))?;
        if current != "0" && !current.is_empty() {
            return Ok(Change::Unchanged);
        }
        // mantiene unix_socket para que root del sistema siga entrando sin contraseña
        self.exec(self.mysql(&format!("ALTER USER 'root'@'localhost' IDENTIFIED VIA unix_socket \
                                       OR mysql_native_password USING PASSWORD('{pw}');"))
                      .mutating())?;
        Ok(Change::Applied)
    }

    pub fn ensure_no_anonymous_db_users(&self) -> Result<Change, HostError> {
        let count = self.sql_query("SELECT COUNT(*) FROM mysql.user WHERE User='';")?;
        if count == "0" || count.is_empty() {
            return Ok(Change::Unchanged);
        }
        self.exec(self.mysql("DELETE FROM mysql.global_priv WHERE User=''; FLUSH PRIVILEGES;").mutating())?;
        Ok(Change::Applied)
    }

    /// Base de datos `name` con acceso total para `user` (local y remoto).
    pub fn ensure_database(&self, name: &str, user: &str, password: &Secret) -> Result<Change, HostError> {
        let db = sql_ident(name)?;
        let user = sql_ident(user)?;
        let pw = sql_quote(password.expose());
        let mut change = Change::Unchanged;

        if self.sql_query(&format!("SHOW DATABASES LIKE '{db}';"))?.is_empty() {
            self.exec(self.mysql(&format!("CREATE DATABASE `{db}`;")).mutating())?;
            change = Change::Applied;
        }
        for host in ["localhost", "%"] {
            let exists = self.sql_query(&format!("SELECT COUNT(*) FROM mysql.user WHERE User='{user}' AND Host='{host}';"))?;
            if exists == "0" || exists.is_empty() {
                self.exec(self.mysql(&format!("CREATE USER '{user}'@'{host}' IDENTIFIED BY '{pw}';")).mutating())?;
                change = Change::Applied;
            } else {
                let current = self.sql_query(&format!("SELECT COUNT(*) FROM mysql.user WHERE User='{user}' AND Host='{host}' \
                                                       AND authentication_string=PASSWORD('{pw}');"))?;
                if current == "0" || current.is_empty() {
                    self.exec(self.mysql(&format!("ALTER USER '{user}'@'{host}' IDENTIFIED BY '{pw}';")).mutating())?;
                    change = Change::Applied;
                }
            }
            let grants = self.sql_query(&format!("SHOW GRANTS FOR '{user}'@'{host}';"))?;
            if !grants.contains(&format!("ON `{db}`.*")) {
                self.exec(self.mysql(&format!("GRANT ALL PRIVILEGES ON `{db}`.* TO '{user}'@'{host}';")).mutating())?;
                change = Change::Applied;
            }
        }
        Ok(change)
    }

    // ---- message broker ----

    pub fn ensure_broker_user(&self, user: &str, password: &Secret) -> Result<Change, HostError> {
        let users = self.query(HostCommand::new("rabbitmqctl").args(["list_users", "-q"]))?;
        let exists = users.lines().any(|l| l.split_whitespace().next() == Some(user));
        let mut change = Change::Unchanged;
        if !exists {
            self.exec(HostCommand::new("rabbitmqctl").args(["add_user", user, password.expose()])
                                                     .mutating()
                                                     .sensitive())?;
            change = Change::Applied;
        } else if !self.check(HostCommand::new("rabbitmqctl").args(["authenticate_user", user, password.expose()])
                                                           .sensitive())?
        {
            self.exec(HostCommand::new("rabbitmqctl").args(["change_password", user, password.expose()])
                                                     .mutating()
                                                     .sensitive())?;
            change = Change::Applied;
        }
        let perms = self.query(HostCommand::new("rabbitmqctl").args(["list_user_permissions", "-q", user]))?;
        let full = perms.lines()
                        .any(|l| l.split_whitespace().collect::<Vec<_>>() == ["/", ".*", ".*", ".*"]);
        if !full {
            self.exec(HostCommand::new("rabbitmqctl").args(["set_permissions", user, ".*", ".*", ".*"]).mutating())?;
            change = Change::Applied;
        }
        Ok(change)
    }

    // ---- identidad ----

    /// Comando `openstack` autenticado como admin con credenciales del run.
    pub fn openstack<I, S>(&self, cfg: &RunConfiguration, args: I) -> HostCommand
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        HostCommand::new("openstack").args(args)
                                     .env("OS_USERNAME", ADMIN_USER)
                                     .env("OS_PASSWORD", cfg.secrets().admin_password.expose())
                                     .env("OS_PROJECT_NAME", ADMIN_PROJECT)
                                     .env("OS_USER_DOMAIN_NAME", "Default")
                                     .env("OS_PROJECT_DOMAIN_NAME", "Default")
                                     .env("OS_AUTH_URL", identity_url(cfg))
                                     .env("OS_IDENTITY_API_VERSION", "3")
                                     .env("OS_REGION_NAME", REGION)
    }

    /// `openstack <kind> show <name>`; si no existe, `openstack <kind> create
    /// <create_args...> <name>`.
    pub fn ensure_identity_resource(&self,
                                    cfg: &RunConfiguration,
                                    kind: &str,
                                    name: &str,
                                    create_args: &[&str])
                                    -> Result<Change, HostError> {
        if self.check(self.openstack(cfg, [kind, "show", name]))? {
            return Ok(Change::Unchanged);
        }
        self.exec(self.openstack(cfg, [kind, "create"]).args(create_args.iter().copied()).arg(name).mutating())?;
        Ok(Change::Applied)
    }

    /// Usuario de identity con contraseña verificada: si ya existe se emite
    /// un token con sus credenciales y, si falla, se le repone `password`.
    pub fn ensure_identity_user(&self, cfg: &RunConfiguration, name: &str, password: &Secret) -> Result<Change, HostError> {
        let pw = password.expose();
        if !self.check(self.openstack(cfg, ["user", "show", name]))? {
            let create = self.openstack(cfg, ["user", "create", "--domain", "default", "--password", pw, name]);
            self.exec(create.mutating().sensitive())?;
            return Ok(Change::Applied);
        }
        let token = HostCommand::new("openstack").args(["token", "issue", "-f", "value", "-c", "id"])
                                                 .env("OS_USERNAME", name)
                                                 .env("OS_PASSWORD", pw)
                                                 .env("OS_USER_DOMAIN_NAME", "Default")
                                                 .env("OS_AUTH_URL", identity_url(cfg))
                                                 .env("OS_IDENTITY_API_VERSION", "3")
                                                 .sensitive();
        if self.check(token)? {
            return Ok(Change::Unchanged);
        }
        self.exec(self.openstack(cfg, ["user", "set", "--password", pw, name]).mutating().sensitive())?;
        Ok(Change::Applied)
    }

    pub fn ensure_role_assignment(&self, cfg: &RunConfiguration, project: &str, user: &str, role: &str) -> Result<Change, HostError> {
        let listed = self.query(self.openstack(cfg,
                                               ["role", "assignment", "list", "--project", project, "--user", user, "--role",
                                                role, "--names", "-f", "value"]))?;
        if !listed.is_empty() {
            return Ok(Change::Unchanged);
        }
        self.exec(self.openstack(cfg, ["role", "add", "--project", project, "--user", user, role]).mutating())?;
        Ok(Change::Applied)
    }

    /// Entrada de catálogo `name` de tipo `service_type`.
    pub fn ensure_service(&self,
                          cfg: &RunConfiguration,
                          name: &str,
                          service_type: &str,
                          description: &str)
                          -> Result<Change, HostError> {
        if self.check(self.openstack(cfg, ["service", "show", name]))? {
            return Ok(Change::Unchanged);
        }
        self.exec(self.openstack(cfg, ["service", "create", "--name", name, "--description", description, service_type])
                      .mutating())?;
        Ok(Change::Applied)
    }

    /// Endpoints public/internal/admin de `service` en la región por defecto.
    pub fn ensure_endpoints(&self, cfg: &RunConfiguration, service: &str, url: &str) -> Result<Change, HostError> {
        let mut change = Change::Unchanged;
        for interface in ["public", "internal", "admin"] {
            let listed = self.query(self.openstack(cfg,
                                                   ["endpoint", "list", "--service", service, "--interface", interface,
                                                    "--region", REGION, "-f", "value", "-c", "ID"]))?;
            if listed.is_empty() {
                self.exec(self.openstack(cfg, ["endpoint", "create", "--region", REGION, service, interface, url]).mutating())?;
                change = Change::Applied;
            }
        }
        Ok(change)
    }
}

/// URL del API de identidad del run.
pub fn identity_url(cfg: &RunConfiguration) -> String {
    format!("http://{}:5000/v3", cfg.management_host())
}

/// Escapa un literal para ir entre comillas simples en SQL.
pub fn sql_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Nombres de base de datos/usuario: sólo `[A-Za-z0-9_]`.
fn sql_ident(name: &str) -> Result<&str, HostError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(HostError::Check(format!("invalid database identifier {name:?}")))
    }
}
