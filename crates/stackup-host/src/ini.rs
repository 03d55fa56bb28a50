//! Edición mínima de ficheros INI que preserva el resto del documento.
//!
//! Sólo lo necesario para "fijar clave=valor en una sección": comentarios,
//! orden y claves ajenas quedan intactos. Una clave comentada (`#key = x`)
//! no cuenta como presente.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    lines: Vec<String>,
}

impl IniDocument {
    pub fn parse(content: &str) -> Self {
        Self { lines: content.lines().map(str::to_string).collect() }
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Rango de líneas del cuerpo de `section` (sin la cabecera) si existe.
    fn section_body(&self, section: &str) -> Option<(usize, usize)> {
        let header = format!("[{section}]");
        let start = self.lines.iter().position(|l| l.trim() == header)? + 1;
        let end = self.lines[start..].iter()
                                     .position(|l| is_header(l))
                                     .map(|off| start + off)
                                     .unwrap_or(self.lines.len());
        Some((start, end))
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let (start, end) = self.section_body(section)?;
        self.lines[start..end].iter().find_map(|l| split_entry(l).filter(|(k, _)| *k == key).map(|(_, v)| v))
    }

    /// Fija `key = value` en `section`. Devuelve `true` si el documento cambió.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> bool {
        let entry = format!("{key} = {value}");
        match self.section_body(section) {
            Some((start, end)) => {
                let existing = (start..end).find(|i| split_entry(&self.lines[*i]).map(|(k, _)| k == key).unwrap_or(false));
                match existing {
                    Some(i) => {
                        if split_entry(&self.lines[i]).map(|(_, v)| v) == Some(value) {
                            return false;
                        }
                        self.lines[i] = entry;
                    }
                    None => {
                        // insertar tras la última línea no vacía de la sección
                        let mut at = end;
                        while at > start && self.lines[at - 1].trim().is_empty() {
                            at -= 1;
                        }
                        self.lines.insert(at, entry);
                    }
                }
            }
            None => {
                if self.lines.last().map(|l| !l.trim().is_empty()).unwrap_or(false) {
                    self.lines.push(String::new());
                }
                self.lines.push(format!("[{section}]"));
                self.lines.push(entry);
            }
        }
        true
    }
}

fn is_header(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('[') && t.ends_with(']')
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let t = line.trim();
    if t.starts_with('#') || t.starts_with(';') || is_header(t) {
        return None;
    }
    let (k, v) = t.split_once('=')?;
    Some((k.trim(), v.trim()))
}
