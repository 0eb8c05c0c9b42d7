//! INI parsing: the single place where key names map to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::cubemap::CubemapLayout;
use crate::format::FormatRegistry;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Overlays the values found in `ini` on `ConfigFile::default()`.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [export] section
    if let Some(section) = ini.section(Some("export")) {
        if let Some(v) = section.get("format") {
            config.export.format = FormatRegistry::global()
                .lookup_name(v.trim())
                .map_err(|e| invalid("export", "format", v, &e.to_string()))?
                .format_id;
        }
        if let Some(v) = section.get("force_extended") {
            config.export.force_extended = parse_bool("export", "force_extended", v)?;
        }
        if let Some(v) = section.get("no_mip") {
            config.export.no_mip = parse_bool("export", "no_mip", v)?;
        }
        if let Some(v) = section.get("mip_count") {
            let v = v.trim();
            config.export.mip_count = if v.is_empty() {
                None
            } else {
                match v.parse::<u32>() {
                    Ok(0) | Err(_) => {
                        return Err(invalid(
                            "export",
                            "mip_count",
                            v,
                            "must be a positive integer, or empty for the full chain",
                        ))
                    }
                    Ok(n) => Some(n),
                }
            };
        }
        if let Some(v) = section.get("cubemap_layout") {
            config.export.cubemap_layout = parse_layout("export", v)?;
        }
    }

    // [import] section
    if let Some(section) = ini.section(Some("import")) {
        if let Some(v) = section.get("invert_normals") {
            config.import.invert_normals = parse_bool("import", "invert_normals", v)?;
        }
        if let Some(v) = section.get("unpremultiply_alpha") {
            config.import.unpremultiply_alpha = parse_bool("import", "unpremultiply_alpha", v)?;
        }
        if let Some(v) = section.get("cubemap_layout") {
            config.import.cubemap_layout = parse_layout("import", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

pub(super) fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

fn parse_layout(section: &str, value: &str) -> Result<CubemapLayout, ConfigFileError> {
    value.trim().parse().map_err(|_| {
        invalid(
            section,
            "cubemap_layout",
            value,
            "must be one of: h-cross, v-cross, h-cross-fnz, v-cross-fnz, h-strip, v-strip",
        )
    })
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
