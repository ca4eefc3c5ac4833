use crate::cli::InitArgs;
use std::path::Path;

const TEMPLATE: &str = r#"
version = "1"

[database]
url = "${DATABASE_URL}"
max_connections = 5

[tables]
# Only these tables can be queried. Names are matched exactly.
allowed = ["users", "analyst_recommendations"]
"#;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_template(&args.config, args.force)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

fn write_template(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "refusing to overwrite existing file: {} (use --force)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    std::fs::write(path, TEMPLATE.trim_start_matches('\n'))
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablegate::GateConfig;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("tablegate-init-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn template_is_a_valid_config_shape() {
        let raw = TEMPLATE.replace("${DATABASE_URL}", "postgres://localhost/app");
        let config = GateConfig::from_toml_str(&raw).unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert!(config.allow_list().unwrap().contains("users"));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = scratch_dir("overwrite");
        let path = dir.join("nested").join("tablegate.toml");

        write_template(&path, false).unwrap();
        assert!(path.exists());
        assert!(write_template(&path, false).is_err());
        write_template(&path, true).unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }
}
