use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// User settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Initial number of rows.
    pub rows: usize,
    /// Initial number of columns.
    pub columns: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            rows: 10,
            columns: 10,
        }
    }
}

/// Load settings from `config_file`, or from the user config directory.
/// Problems fall back to defaults and are reported as warnings.
pub fn load_settings(config_file: Option<&PathBuf>) -> (Settings, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = config_file.cloned().or_else(user_config_path) else {
        return (Settings::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Settings::default(), warnings);
    }

    let settings = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    (settings.unwrap_or_default(), warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tabula")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_config_path_is_deterministic() {
        // Should never panic and should either be Some(path) or None.
        let _ = user_config_path();
    }

    #[test]
    fn load_settings_reads_grid_size() {
        let temp_path = std::env::temp_dir().join("tabula_config_test.toml");
        std::fs::write(&temp_path, "rows = 4\ncolumns = 3\n").expect("write temp config");

        let (settings, warnings) = load_settings(Some(&temp_path));
        assert_eq!(settings, Settings { rows: 4, columns: 3 });
        assert!(warnings.is_empty());

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn load_settings_fills_missing_keys() {
        let temp_path = std::env::temp_dir().join("tabula_config_partial.toml");
        std::fs::write(&temp_path, "rows = 25\n").expect("write temp config");

        let (settings, _) = load_settings(Some(&temp_path));
        assert_eq!(settings, Settings { rows: 25, columns: 10 });

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn load_settings_falls_back_on_unknown_keys() {
        let temp_path = std::env::temp_dir().join("tabula_config_unknown.toml");
        std::fs::write(&temp_path, "rows = 4\ntheme = \"dark\"\n").expect("write temp config");

        let (settings, warnings) = load_settings(Some(&temp_path));
        assert_eq!(settings, Settings::default());
        assert!(warnings[0].contains("Failed to parse"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn load_settings_rejects_oversized_file() {
        let temp_path = std::env::temp_dir().join("tabula_config_large.toml");
        let content = "#".repeat(MAX_CONFIG_FILE_BYTES as usize + 1);
        std::fs::write(&temp_path, content).expect("write temp config");

        let (settings, warnings) = load_settings(Some(&temp_path));
        assert_eq!(settings, Settings::default());
        assert!(warnings[0].contains("file too large"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn load_settings_warns_when_explicit_file_is_missing() {
        let temp_path = std::env::temp_dir().join("tabula_config_missing.toml");
        let _ = std::fs::remove_file(&temp_path);

        let (settings, warnings) = load_settings(Some(&temp_path));
        assert_eq!(settings, Settings::default());
        assert!(warnings[0].contains("not found"));
    }
}
