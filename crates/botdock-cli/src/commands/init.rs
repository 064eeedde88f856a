use std::path::Path;

use botdock_build::bundle::BUNDLE_DIR;
use botdock_core::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"[project]
# name = "my-bot"          # image repository (default: Cargo package name)
# binary = "my-bot"        # --bin to build when the package has several
# tag = "latest"

[build]
# base_image = "rust:1.84-bookworm"
# runtime_image = "gcr.io/distroless/cc-debian12"
# extra_packages = []
# locked = false
# features = []

[build.env]
# RUST_LOG = "info"

[secret]
# delivery = "runtime_env"  # or "build_time_file" (bakes the token into the image)
# env_var = "TELOXIDE_TOKEN"

[paths]
# workdir = "/app"
# artifact_name = "bot"
# dotenv_file = ".env"
"#;

/// Initialize botdock in an existing Rust project.
pub async fn init_project() -> anyhow::Result<()> {
    init_in(Path::new("."))
}

fn init_in(dir: &Path) -> anyhow::Result<()> {
    if !dir.join("Cargo.toml").exists() {
        anyhow::bail!("Cargo.toml not found. Run this command from a Rust project root.");
    }

    let mut created = Vec::new();

    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        eprintln!("{CONFIG_FILE} already exists, skipping");
    } else {
        std::fs::write(&config_path, CONFIG_TEMPLATE)?;
        created.push(CONFIG_FILE.to_owned());
    }

    let env_example = dir.join(".env.example");
    if env_example.exists() {
        eprintln!(".env.example already exists, skipping");
    } else {
        std::fs::write(&env_example, "TELOXIDE_TOKEN=\nAPP_NAME=Bot\nAPP_VERSION=0.1\n")?;
        created.push(".env.example".to_owned());
    }

    let bundle_pattern = format!("{BUNDLE_DIR}/");
    let added = ensure_gitignored(dir, &[bundle_pattern.as_str(), ".env"])?;
    if !added.is_empty() {
        created.push(format!(".gitignore entries: {}", added.join(", ")));
    }

    if created.is_empty() {
        println!("Nothing to create; already initialized.");
    } else {
        for f in &created {
            println!("Created {f}");
        }
    }

    println!();
    println!("Next steps:");
    println!();
    println!("  1. Put your bot token in .env (never committed, never bundled):");
    println!("     cp .env.example .env");
    println!();
    println!("  2. Load it at startup:");
    println!("     let env = botdock::BotEnv::load()?;");
    println!();
    println!("  3. Build and run:");
    println!("     botdock build");
    println!("     botdock run");

    Ok(())
}

/// Append missing patterns to `.gitignore`; returns the ones added.
fn ensure_gitignored(dir: &Path, patterns: &[&str]) -> anyhow::Result<Vec<String>> {
    let path = dir.join(".gitignore");
    let existing = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };

    let missing: Vec<String> = patterns
        .iter()
        .filter(|p| !existing.lines().any(|l| l.trim() == **p))
        .map(|p| (*p).to_owned())
        .collect();
    if missing.is_empty() {
        return Ok(missing);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for p in &missing {
        content.push_str(p);
        content.push('\n');
    }
    std::fs::write(&path, content)?;
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_loads_as_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), CONFIG_TEMPLATE).unwrap();

        let config = botdock_core::BotdockConfig::load(tmp.path()).unwrap();
        assert_eq!(config.project.tag, "latest");
        assert_eq!(config.secret, botdock_core::SecretConfig::default());
        assert_eq!(config.paths, botdock_core::StagePaths::default());
        assert!(config.build.env.is_empty());
    }

    #[test]
    fn init_requires_cargo_project() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(init_in(tmp.path()).is_err());
    }

    #[test]
    fn init_creates_files_and_skips_existing() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Cargo.toml"), "[package]\nname = \"bot\"\n").unwrap();
        std::fs::write(tmp.path().join(".env.example"), "KEEP=1\n").unwrap();

        init_in(tmp.path()).unwrap();

        assert!(tmp.path().join(CONFIG_FILE).exists());
        let example = std::fs::read_to_string(tmp.path().join(".env.example")).unwrap();
        assert_eq!(example, "KEEP=1\n");
        let ignore = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
        assert!(ignore.contains(".botdock-bundle/"));
    }

    #[test]
    fn gitignore_entries_added_once() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(".gitignore"), "/target").unwrap();

        let added = ensure_gitignored(tmp.path(), &[".botdock-bundle/", ".env"]).unwrap();
        assert_eq!(added, [".botdock-bundle/", ".env"]);
        let again = ensure_gitignored(tmp.path(), &[".botdock-bundle/", ".env"]).unwrap();
        assert!(again.is_empty());

        let content = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
        assert_eq!(content, "/target\n.botdock-bundle/\n.env\n");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn gitignore_is_idempotent(
                existing in "[a-z/.\\n]{0,40}",
                patterns in proptest::collection::vec("[a-z.]{1,12}/?", 1..4),
            ) {
                let tmp = tempfile::TempDir::new().unwrap();
                std::fs::write(tmp.path().join(".gitignore"), &existing).unwrap();
                let refs: Vec<&str> = patterns.iter().map(String::as_str).collect();

                ensure_gitignored(tmp.path(), &refs).unwrap();
                let first = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
                let added = ensure_gitignored(tmp.path(), &refs).unwrap();
                let second = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();

                prop_assert!(added.is_empty());
                prop_assert_eq!(&first, &second);
                for p in &refs {
                    prop_assert!(second.lines().any(|l| l.trim() == *p));
                }
            }
        }
    }
}
