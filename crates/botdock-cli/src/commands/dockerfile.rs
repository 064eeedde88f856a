use std::path::Path;

use super::{BotProject, DeliveryArg};

/// Print the rendered two-stage Dockerfile.
pub async fn dockerfile(delivery: Option<DeliveryArg>) -> anyhow::Result<()> {
    let project = BotProject::load(Path::new("."))?.with_delivery(delivery);
    print!("{}", project.render_dockerfile());
    Ok(())
}
