/// Errors a bot binary can hit while loading its environment at startup.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("{name} is not set; pass it with `docker run -e {name}` or bake it in with delivery = build_time_file")]
    MissingToken { name: String },

    #[error("environment variable {name} is not valid unicode")]
    NotUnicode { name: String },

    #[error("failed to load .env")]
    Dotenv {
        #[source]
        source: dotenvy::Error,
    },
}
