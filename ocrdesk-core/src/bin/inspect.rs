use std::error::Error;
use std::path::Path;

use tracing::info;

use ocrdesk_core::project::Project;

/// Prints a summary of a saved project file.
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: inspect <project file>")?;
    info!("Loading project from: {}", path);

    let project = Project::load(Path::new(&path))?;

    if std::env::args().any(|arg| arg == "--json") {
        for page in &project.pages {
            println!("{}", serde_json::to_string_pretty(page)?);
        }
        return Ok(());
    }

    println!(
        "{}: {} page(s), default language {}, paper {}",
        project.name,
        project.pages.len(),
        project.default_language,
        project.default_paper_size
    );

    for page in &project.pages {
        println!(
            "  {} ({}, {} dpi): {} region(s), {} separator(s)",
            page.name,
            page.image_path,
            page.dpi,
            page.regions.len(),
            page.separators.len()
        );
        for region in page.regions.ordered() {
            let status = if region.recognized {
                "recognized"
            } else {
                "pending"
            };
            println!(
                "    #{:<3} {:?} {:.0}x{:.0} [{}] {}",
                region.order,
                region.kind,
                region.bbox.width(),
                region.bbox.height(),
                region.language,
                status
            );
        }
    }

    Ok(())
}
