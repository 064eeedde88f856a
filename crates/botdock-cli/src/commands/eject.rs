use std::path::Path;

use super::BotProject;

pub async fn eject() -> anyhow::Result<()> {
    let project = BotProject::load(Path::new("."))?;
    let path = botdock_build::eject::eject(&project.dir, &project.render_dockerfile())?;

    println!("Ejected build config to {}", path.display());
    println!("You can now edit it directly. botdock build will use this file.");
    Ok(())
}
