use std::{env, error::Error, path::PathBuf};

use skipgram_stream::{Embeddings, Inspection};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// quick look at trained embeddings, ran independently of the batch stream.
// argument to this executable is the directory holding
// final_standard_embeddings.npy, final_normalized_embeddings.npy and dictionary.txt
// example: ... ./build

const DEFAULT_BASE_DIR: &str = "./build";

fn main() {

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let base_dir = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR));
    if let Err(e) = run_inspection(base_dir) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run_inspection(base_dir: PathBuf) -> Result<(), Box<dyn Error>> {

    info!("reading embeddings and dictionary from {}", base_dir.display());
    let inspection = Inspection::open(&base_dir)?;

    let (rows, dim) = inspection.shape();
    info!("data sizes: {} ({} x {})", inspection.size(), rows, dim);
    info!("rows 500..512:\n{}", inspection.subset(Embeddings::Standard, 500..512));

    let (min, max) = inspection.norm_summary(Embeddings::Standard)?;
    info!("vector lengths range from {} to {}", min, max);

    let id = inspection.random_id().ok_or("dictionary and embeddings share no rows")?;
    info!("random token {}: {}", id, inspection.token(id).unwrap_or("?"));
    info!("vector length {}", inspection.vector_norm(Embeddings::Standard, id)?);
    info!("normal vector length {}", inspection.vector_norm(Embeddings::Normalized, id)?);

    Ok(())
}
