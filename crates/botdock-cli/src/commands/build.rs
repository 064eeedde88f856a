use std::path::Path;

use super::DeliveryArg;
use super::build_pipeline::{self, BuildOptions};

/// Build the runtime image and print the promoted tag.
pub async fn build(
    allow_dirty: bool,
    delivery: Option<DeliveryArg>,
    tag: Option<String>,
) -> anyhow::Result<()> {
    let outcome = build_pipeline::run(
        Path::new("."),
        BuildOptions {
            allow_dirty,
            delivery,
            tag: tag.as_deref(),
        },
    )
    .await?;

    for step in &outcome.steps {
        eprintln!("{step}");
    }
    println!("{}", outcome.report.image);
    Ok(())
}
