//! Serialization of `ConfigFile` to the commented INI written on save.

use std::path::Path;

use super::settings::ConfigFile;
use crate::format::FormatRegistry;

/// Converts a `ConfigFile` to a commented INI string.
pub fn to_config_string(config: &ConfigFile) -> String {
    let mip_count = config
        .export
        .mip_count
        .map(|n| n.to_string())
        .unwrap_or_default();

    let format = FormatRegistry::global()
        .lookup(config.export.format)
        .map(|f| f.name)
        .unwrap_or_default();

    format!(
        r#"[export]
; Target format for exported textures, by DXGI name (default: BC1_UNORM)
; Examples: BC1_UNORM, BC3_UNORM, BC7_UNORM_SRGB, R8G8B8A8_UNORM, R16G16B16A16_FLOAT
format = {}
; Always write the extended (DX10) header, even when a legacy header suffices
force_extended = {}
; Export only the base level
no_mip = {}
; Mip levels to generate for images without a chain (empty = full chain)
mip_count = {}
; Layout of flattened cubemap images passed to 'export --cubemap':
;   h-cross, v-cross, h-cross-fnz, v-cross-fnz, h-strip, v-strip
cubemap_layout = {}

[import]
; Flip the green channel of normal maps (+Y <-> -Y)
invert_normals = {}
; Divide colour by alpha for textures flagged as premultiplied
unpremultiply_alpha = {}
; Layout used when flattening cubemaps to a single image:
;   h-cross, v-cross, h-cross-fnz, v-cross-fnz, h-strip, v-strip
cubemap_layout = {}

[logging]
; Directory for log files (default: ~/.ddsforge/logs)
directory = {}
; Log file name, cleared at the start of every run
file = {}
"#,
        format,
        config.export.force_extended,
        config.export.no_mip,
        mip_count,
        config.export.cubemap_layout,
        config.import.invert_normals,
        config.import.unpremultiply_alpha,
        config.import.cubemap_layout,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Renders paths under the home directory with a `~/` prefix.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
