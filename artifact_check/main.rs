use anyhow::Result;
use premium_server::config::{MODEL_FILE, PREPROCESSOR_FILE};
use premium_server::models::ColumnTransform;
use premium_server::state::AppState;
use std::path::Path;

fn main() -> Result<()> {
    // Get the artifact directory from command-line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        println!("Usage: artifact_check <artifact_dir>");
        std::process::exit(1);
    }
    let dir = Path::new(&args[1]);
    println!("Checking artifacts in {}", dir.display());

    let state = AppState::load(&dir.join(MODEL_FILE), &dir.join(PREPROCESSOR_FILE), true)?;

    println!("Expected input features:");
    for transform in &state.preprocessor.transforms {
        describe(transform);
    }
    println!(
        "Preprocessor output width: {}",
        state.preprocessor.output_width()
    );
    println!(
        "Model: {} with {} input features",
        state.model.kind(),
        state.model.n_features
    );
    println!("Artifacts are consistent");
    Ok(())
}

fn describe(transform: &ColumnTransform) {
    match transform {
        ColumnTransform::StandardScaler { columns, .. } => {
            for column in columns {
                println!("  {column}: number (scaled)");
            }
        }
        ColumnTransform::Passthrough { columns } => {
            for column in columns {
                println!("  {column}: number");
            }
        }
        ColumnTransform::OneHotEncoder {
            columns,
            categories,
            ..
        } => {
            for (column, cats) in columns.iter().zip(categories) {
                println!("  {column}: one of {}", cats.join(", "));
            }
        }
    }
}
