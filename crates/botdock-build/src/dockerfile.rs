pub use botdock_core::BUILDER_STAGE;
use botdock_core::{
    BotdockConfig, BuildConfig, CargoProject, RUNTIME_ENV_LABEL, SecretDelivery, StagePaths,
};

/// Stage 1: compile the bot inside the full toolchain image.
pub struct BuilderStage<'a> {
    build: &'a BuildConfig,
    paths: &'a StagePaths,
    binary: &'a str,
    /// Build argument captured into the dotenv file, if any.
    secret_arg: Option<&'a str>,
}

impl BuilderStage<'_> {
    pub fn render(&self) -> String {
        let workdir = &self.paths.workdir;

        let extra_packages = if self.build.extra_packages.is_empty() {
            String::new()
        } else {
            format!(
                "RUN apt-get update && apt-get install -y {} && rm -rf /var/lib/apt/lists/*\n",
                self.build.extra_packages.join(" ")
            )
        };

        let secret = match self.secret_arg {
            Some(var) => format!(
                "ARG {var}\n\
                 RUN test -n \"${var}\" && printf '{var}=%s\\n' \"${var}\" > {dotenv}\n",
                dotenv = self.paths.dotenv_path(),
            ),
            None => String::new(),
        };

        let mut cargo = String::from("cargo build --release");
        if self.build.locked {
            cargo.push_str(" --locked");
        }
        if !self.build.features.is_empty() {
            cargo.push_str(&format!(" --features {}", self.build.features.join(",")));
        }

        format!(
            r#"# === Stage 1: Builder ===
FROM {base} AS {BUILDER_STAGE}
{extra_packages}WORKDIR {workdir}
COPY . .
{secret}RUN {cargo} --bin {binary}
"#,
            base = self.build.base_image,
            binary = self.binary,
        )
    }
}

/// Stage 2: minimal image holding only the artifact (and the dotenv file
/// when the credential is baked in).
pub struct RuntimeStage<'a> {
    build: &'a BuildConfig,
    paths: &'a StagePaths,
    binary: &'a str,
    copy_dotenv: bool,
    /// Static `ENV` entries, already sorted.
    env: Vec<(String, String)>,
    /// Variable names declared, never bound.
    declared: Vec<&'a str>,
}

impl RuntimeStage<'_> {
    pub fn render(&self) -> String {
        let workdir = &self.paths.workdir;
        let artifact = self.paths.runtime_artifact_path();

        let mut copies = format!(
            "COPY --from={BUILDER_STAGE} {src} {artifact}\n",
            src = self.paths.builder_artifact_path(self.binary),
        );
        if self.copy_dotenv {
            let dotenv = self.paths.dotenv_path();
            copies.push_str(&format!("COPY --from={BUILDER_STAGE} {dotenv} {dotenv}\n"));
        }

        let env: String = self
            .env
            .iter()
            .map(|(k, v)| format!("ENV {k}=\"{}\"\n", escape_env_value(v)))
            .collect();

        let label = if self.declared.is_empty() {
            String::new()
        } else {
            format!("LABEL {RUNTIME_ENV_LABEL}=\"{}\"\n", self.declared.join(","))
        };

        format!(
            r#"# === Stage 2: Runtime ===
FROM {runtime}
WORKDIR {workdir}
{copies}{env}{label}ENTRYPOINT ["{artifact}"]
"#,
            runtime = self.build.runtime_image,
        )
    }
}

/// Renders the two-stage pipeline description for one bot binary.
///
/// Both stages are built from the same [`StagePaths`], and the variant is
/// chosen by `[secret].delivery` rather than by a second template.
pub struct DockerfileGenerator<'a> {
    config: &'a BotdockConfig,
    project: &'a CargoProject,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(config: &'a BotdockConfig, project: &'a CargoProject) -> Self {
        Self { config, project }
    }

    pub fn builder_stage(&self) -> BuilderStage<'a> {
        let secret_arg = match self.config.secret.delivery {
            SecretDelivery::BuildTimeFile => Some(self.config.secret.env_var.as_str()),
            SecretDelivery::RuntimeEnv => None,
        };
        BuilderStage {
            build: &self.config.build,
            paths: &self.config.paths,
            binary: &self.project.binary,
            secret_arg,
        }
    }

    pub fn runtime_stage(&self) -> RuntimeStage<'a> {
        let mut env: Vec<(String, String)> = self
            .config
            .build
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if self.config.build.app_metadata_env {
            for (key, value) in [
                ("APP_NAME", self.project.name.as_str()),
                ("APP_VERSION", self.project.version.as_str()),
            ] {
                if !self.config.build.env.contains_key(key) {
                    env.push((key.to_owned(), value.to_owned()));
                }
            }
        }
        env.sort();

        RuntimeStage {
            build: &self.config.build,
            paths: &self.config.paths,
            binary: &self.project.binary,
            copy_dotenv: self.config.secret.delivery.bakes_into_image(),
            env,
            declared: vec![self.config.secret.env_var.as_str()],
        }
    }

    pub fn render(&self) -> String {
        tracing::debug!(
            binary = %self.project.binary,
            delivery = %self.config.secret.delivery,
            "rendering Dockerfile"
        );
        format!(
            "{}\n{}",
            self.builder_stage().render(),
            self.runtime_stage().render()
        )
    }
}

/// `ENV` values are double-quoted; quotes, backslashes and `$` are literal.
fn escape_env_value(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for c in v.chars() {
        if matches!(c, '"' | '\\' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
