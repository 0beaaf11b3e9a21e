use clap::builder::BoolishValueParser;
use clap::Parser;
use granary_http::{serve, ServerConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "granary", about = "Serve a grant activity corpus over HTTP")]
struct Cli {
    /// Corpus file: a JSON array of records or one record per line
    #[arg(long, env = "GRANARY_CORPUS")]
    corpus: Option<PathBuf>,
    #[arg(long, env = "GRANARY_BIND_ADDR", default_value = "127.0.0.1:7800")]
    bind_addr: String,
    #[arg(long, env = "GRANARY_BASE_PATH", default_value = "/api/activities")]
    base_path: String,
    #[arg(long, env = "GRANARY_DEFAULT_ROWS", default_value_t = 10)]
    default_rows: usize,
    #[arg(long, env = "GRANARY_MAX_ROWS", default_value_t = 100)]
    max_rows: usize,
    #[arg(long, env = "GRANARY_QUERY_TIMEOUT_MS", default_value_t = 2000)]
    query_timeout_ms: u64,
    /// Start even if the corpus cannot be loaded; searches answer 503
    #[arg(long, env = "GRANARY_LENIENT_STARTUP", value_parser = BoolishValueParser::new())]
    lenient_startup: bool,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            corpus_path: self.corpus,
            bind_addr: self.bind_addr,
            base_path: self.base_path,
            default_rows: self.default_rows,
            max_rows: self.max_rows,
            query_timeout: Duration::from_millis(self.query_timeout_ms),
            lenient_startup: self.lenient_startup,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config();
    serve(config).await
}
