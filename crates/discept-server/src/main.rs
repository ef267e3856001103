//! DiScEPT: multilingual TEI alignment editing server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use discept_model::AlignmentDocument;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DISCEPT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

async fn load(path: &Path) -> anyhow::Result<AlignmentDocument> {
    let mut doc = AlignmentDocument::new();
    doc.read_from_file(path)
        .await
        .map_err(|e| anyhow::anyhow!("{}: {} [{}]", path.display(), e, e.kind()))?;
    Ok(doc)
}

async fn validate(path: &Path) -> anyhow::Result<()> {
    let doc = load(path).await?;
    let summary = doc.summary();
    println!("=== DiScEPT Document ===");
    println!();
    println!("File:               {}", path.display());
    println!("Title:              {}", doc.project().title.as_deref().unwrap_or("-"));
    println!("Languages:          {}", summary.languages.len());
    for language in &summary.languages {
        println!(
            "  - {:<8} {} images, {} bytes",
            language.language, language.images, language.body_bytes
        );
    }
    println!("Aligned pairs:      {}", summary.alignments.len());
    for pair in &summary.alignments {
        println!("  - {}/{}: {} links", pair.lang_a, pair.lang_b, pair.links);
    }
    Ok(())
}

async fn normalize(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let xml = load(input).await?.generate_tei()?;
    match output {
        Some(out) => {
            tokio::fs::write(out, &xml).await?;
            info!("Wrote {} bytes to {}", xml.len(), out.display());
        }
        None => print!("{}", xml),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "--validate" | "validate" => {
                if args.len() < 3 {
                    eprintln!("Usage: discept validate <file>");
                    std::process::exit(1);
                }
                if let Err(e) = validate(Path::new(&args[2])).await {
                    eprintln!("Invalid: {}", e);
                    std::process::exit(1);
                }
                return Ok(());
            }
            "--normalize" | "normalize" => {
                if args.len() < 3 {
                    eprintln!("Usage: discept normalize <input> [output]");
                    std::process::exit(1);
                }
                let output = args.get(3).map(Path::new);
                normalize(Path::new(&args[2]), output).await?;
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("DiScEPT: multilingual TEI alignment server");
                println!();
                println!("Usage: discept [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  validate <file>          Parse a merged TEI file and print its summary");
                println!("  normalize <in> [out]     Parse and regenerate a merged TEI file");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'discept help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();

    info!("Data directory: {}", data_dir.display());

    let config = discept_core::DisceptConfig::from_env(&data_dir)?;
    let port = config.port;

    let state = Arc::new(AppState::new(config));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("DiScEPT server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
