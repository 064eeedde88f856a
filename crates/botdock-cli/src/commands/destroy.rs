use std::path::Path;

use botdock_build::bundle;
use botdock_engine::DockerClient;

use super::BotProject;

/// Remove the image tag and the local bundle.
pub async fn destroy(skip_confirm: bool) -> anyhow::Result<()> {
    let project = BotProject::load(Path::new("."))?;
    let image = project.image(None).to_string();

    if !skip_confirm {
        println!("This will delete:");
        println!("  - Image tag {image}");
        println!("  - Local {}/", bundle::BUNDLE_DIR);
        println!();
        if !super::confirm("Are you sure?")? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let client = DockerClient::new();
    println!("Removing image {image}...");
    if client.image_exists(&image).await {
        client.remove_image(&image).await?;
        println!("  Removed.");
    } else {
        println!("  Skipped (not found)");
    }

    if bundle::remove_bundle(&project.dir)? {
        println!("Removed local {}/", bundle::BUNDLE_DIR);
    }

    println!();
    println!("Destroy complete.");
    Ok(())
}
