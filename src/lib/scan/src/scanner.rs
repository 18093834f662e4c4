use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use device::{ClassId, CStruct, Driver, Uclass};

use crate::error::{Error, Result};
use crate::parser;

/// Everything recovered from a pass over the source tree: drivers, their
/// uclasses, the structs they reference, driver aliases, and the
/// compatible-string tables that bind devicetree nodes to drivers.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub drivers: BTreeMap<String, Driver>,
    pub driver_aliases: BTreeMap<String, String>,
    pub uclasses: BTreeMap<String, Uclass>,
    pub structs: BTreeMap<String, CStruct>,
    /// Compatible string -> name of the driver it should bind to, keeping
    /// whichever driver name sorts first when more than one compatible
    /// table claims the same string.
    pub compat_to_driver: BTreeMap<String, String>,
    pub missing_drivers: BTreeSet<String>,
    pub warnings: BTreeMap<String, Vec<String>>,
}

impl ScanResult {
    fn warn(&mut self, driver: &str, message: String) {
        self.warnings.entry(driver.to_string()).or_default().push(message);
    }
}

/// Drives a single pass over a U-Boot-style source tree: `.c` files are
/// scanned for `U_BOOT_DRIVER`/`UCLASS_DRIVER` declarations, `.h` files for
/// struct definitions.
pub struct Scanner {
    basedir: PathBuf,
    drivers_additional: Vec<String>,
    phase: Option<String>,
}

impl Scanner {
    pub fn new(basedir: impl Into<PathBuf>, drivers_additional: Vec<String>, phase: Option<String>) -> Self {
        Self {
            basedir: basedir.into(),
            drivers_additional,
            phase,
        }
    }

    pub fn scan(&self) -> Result<ScanResult> {
        let mut result = ScanResult::default();
        self.walk(&self.basedir, &mut result)?;

        for extra in &self.drivers_additional {
            if extra.is_empty() {
                continue;
            }
            let path = if extra.starts_with('/') {
                PathBuf::from(extra)
            } else {
                self.basedir.join(extra)
            };
            self.scan_driver_file(&path, &mut result)?;
        }

        Ok(result)
    }

    fn walk(&self, dir: &Path, result: &mut ScanResult) -> Result<()> {
        let rel = dir.strip_prefix(&self.basedir).unwrap_or(dir);
        let rel_str = rel.to_string_lossy();
        if rel_str.starts_with("build") || rel_str.starts_with(".git") {
            return Ok(());
        }

        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::Io(dir.display().to_string(), e))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                self.walk(&path, result)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some("c") {
                self.scan_driver_file(&path, result)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some("h") {
                self.scan_header_file(&path, result)?;
            }
        }
        Ok(())
    }

    fn scan_driver_file(&self, path: &Path, result: &mut ScanResult) -> Result<()> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                log::warn!("skipping file '{}' due to encoding error", path.display());
                return Ok(());
            }
            Err(e) => return Err(Error::Io(path.display().to_string(), e)),
        };
        let fname = path.display().to_string();
        if contents.contains("U_BOOT_DRIVER") {
            parse_drivers(&fname, &contents, result, self.phase.as_deref())?;
        }
        if contents.contains("UCLASS_DRIVER") {
            parse_uclass_drivers(&fname, &contents, result)?;
        }
        Ok(())
    }

    fn scan_header_file(&self, path: &Path, result: &mut ScanResult) -> Result<()> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                log::warn!("skipping file '{}' due to encoding error", path.display());
                return Ok(());
            }
            Err(e) => return Err(Error::Io(path.display().to_string(), e)),
        };
        if !contents.contains("struct") {
            return Ok(());
        }
        let fname = rel_include_path(&self.basedir, path);
        for line in parser::logical_lines(&contents) {
            if let Some(name) = parser::parse_struct_decl(&line) {
                result
                    .structs
                    .insert(name.clone(), CStruct::new(name, fname.clone()));
            }
        }
        Ok(())
    }
}

/// U-Boot headers are `#include`d as a path relative to `include/`, with
/// `arch/<arch>/include/asm/...` remapped to the `asm/...` alias every
/// arch's include path provides.
fn rel_include_path(basedir: &Path, fname: &Path) -> String {
    let include_dir = basedir.join("include");
    let rel = fname
        .strip_prefix(&include_dir)
        .unwrap_or(fname)
        .to_string_lossy()
        .into_owned();
    if let Some(idx) = rel.find("/include/asm/") {
        format!("asm/{}", &rel[idx + "/include/asm/".len()..])
    } else {
        rel
    }
}

fn parse_uclass_drivers(fname: &str, contents: &str, result: &mut ScanResult) -> Result<()> {
    let mut current: Option<(String, Uclass)> = None;

    for line in parser::logical_lines(contents) {
        if let Some((_, uclass)) = current.as_mut() {
            if let Some(id) = parser::parse_id(&line) {
                uclass.set_id(ClassId::new(id));
            } else if let Some(s) = parser::parse_auto_member(&line, "priv_auto") {
                uclass.set_priv_auto(s);
            } else if let Some(s) = parser::parse_auto_member(&line, "per_device_auto") {
                uclass.set_per_device_auto(s);
            } else if let Some(s) = parser::parse_auto_member(&line, "per_device_plat_auto") {
                uclass.set_per_device_plat_auto(s);
            } else if let Some(s) = parser::parse_auto_member(&line, "per_child_auto") {
                uclass.set_per_child_auto(s);
            } else if let Some(s) = parser::parse_auto_member(&line, "per_child_plat_auto") {
                uclass.set_per_child_plat_auto(s);
            } else if line.contains("};") {
                let (name, uclass) = current.take().unwrap();
                let id = uclass
                    .id()
                    .ok_or_else(|| Error::MissingUclassId(fname.to_string(), name.clone()))?
                    .clone();
                result.uclasses.insert(id.as_str().to_string(), uclass);
            }
            continue;
        }

        if let Some(name) = parser::parse_uclass_driver_decl(&line) {
            current = Some((name.clone(), Uclass::new(name)));
        }
    }
    Ok(())
}

struct DriverParseState {
    driver: Driver,
    compat_var: Option<String>,
}

fn parse_drivers(fname: &str, contents: &str, result: &mut ScanResult, phase: Option<&str>) -> Result<()> {
    let mut of_match: BTreeMap<String, BTreeMap<String, Option<String>>> = BTreeMap::new();
    let mut drivers_in_file: BTreeMap<String, Driver> = BTreeMap::new();

    let mut state: Option<DriverParseState> = None;
    let mut ids_name: Option<String> = None;
    let mut compat_dict: BTreeMap<String, Option<String>> = BTreeMap::new();

    for line in parser::logical_lines(contents) {
        if let Some(st) = state.as_mut() {
            let driver = &mut st.driver;
            if let Some(s) = parser::parse_auto_member(&line, "priv_auto") {
                driver.set_priv_auto(s);
            } else if let Some(s) = parser::parse_auto_member(&line, "plat_auto") {
                driver.set_plat_auto(s);
            } else if let Some(s) = parser::parse_auto_member(&line, "per_child_plat_auto") {
                driver.set_per_child_plat_auto(s);
            } else if let Some(s) = parser::parse_auto_member(&line, "per_child_auto") {
                driver.set_per_child_auto(s);
            } else if let Some(id) = parser::parse_id(&line) {
                driver.set_uclass_id(ClassId::new(id));
            } else if let Some(var) = parser::parse_of_match(&line) {
                st.compat_var = Some(var);
            } else if let Some(phase) = parser::parse_phase(&line) {
                driver.set_phase(phase);
            } else if let Some(hdr) = parser::parse_header_decl(&line) {
                driver.add_header(hdr);
            } else if line.contains("};") {
                let DriverParseState { mut driver, compat_var } = state.take().unwrap();
                let is_root = driver.name() == "root_driver";
                if driver.uclass_id().is_some() && (compat_var.is_some() || is_root) {
                    if !is_root {
                        let var = compat_var.unwrap();
                        let compats = of_match
                            .get(&var)
                            .ok_or_else(|| Error::UnknownCompatVar(fname.to_string(), var.clone()))?;
                        for (compat, data) in compats {
                            *driver.compat_mut().entry(compat.clone()).or_default() =
                                data.clone().unwrap_or_default();
                            match result.compat_to_driver.get(compat) {
                                Some(old) if old.as_str() <= driver.name() => {}
                                _ => {
                                    result
                                        .compat_to_driver
                                        .insert(compat.clone(), driver.name().to_string());
                                }
                            }
                        }
                    }
                    drivers_in_file.insert(driver.name().to_string(), driver);
                } else {
                    let msg = if driver.uclass_id().is_none() {
                        format!("Missing .uclass in {fname}")
                    } else {
                        format!("Missing .compatible in {fname}")
                    };
                    result.warn(driver.name(), msg);
                }
            }
            continue;
        }

        if let Some(name) = &ids_name {
            if let Some((compat, data)) = parser::parse_compat_entry(&line) {
                compat_dict.insert(compat, data);
            } else if line.contains("};") {
                of_match.insert(name.clone(), std::mem::take(&mut compat_dict));
                ids_name = None;
            }
            continue;
        }

        if let Some(name) = parser::parse_driver_decl(&line) {
            state = Some(DriverParseState {
                driver: Driver::new(name, fname.to_string()),
                compat_var: None,
            });
        } else if let Some(name) = parser::parse_udevice_id_decl(&line) {
            ids_name = Some(name);
        } else if let Some((alias, name)) = parser::parse_alias(&line) {
            result.driver_aliases.insert(alias, name);
        }
    }

    for (name, mut driver) in drivers_in_file {
        if let Some(existing) = result.drivers.get_mut(&name) {
            if let Some(phase) = phase {
                if existing.phase() == Some(phase) {
                    existing.add_dup(driver.fname().to_string());
                    continue;
                }
                // Phase doesn't match: assume the new driver is the right one.
            } else {
                driver.set_warn_dups(true);
            }
            driver.add_dup(existing.fname().to_string());
        }
        result.drivers.insert(name, driver);
    }

    Ok(())
}
