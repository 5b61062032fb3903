use skipgram_stream::Run;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = Run::run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
