use std::path::Path;

use botdock_engine::DockerClient;

use super::BotProject;

pub async fn status(tag: Option<String>) -> anyhow::Result<()> {
    let project = BotProject::load(Path::new("."))?;
    let image = project.image(tag.as_deref()).to_string();

    let client = DockerClient::new();
    if !client.image_exists(&image).await {
        println!("{image}: not built");
        return Ok(());
    }
    let summary = client.inspect(&image).await?;

    println!("Image:        {image}");
    println!("ID:           {}", summary.short_id());
    println!("Created:      {}", summary.created);
    println!("Size:         {:.1} MB", summary.size_mb());
    println!("Tags:         {}", summary.repo_tags.join(", "));
    println!("Workdir:      {}", summary.config.working_dir);
    println!("Entry point:  {:?}", summary.config.entrypoint);
    println!("Declared env: {}", summary.declared_env().join(", "));
    println!("Delivery:     {}", project.config.secret.delivery);
    Ok(())
}
