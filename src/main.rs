use calldata_extractor::{
    read_records, CalldataSource, EtherscanSource, Extractor, FileNaming, MethodTable,
    OutputLayout, RetryConfig, RpcNodeSource, RunSummary, TransactionRecord,
    DEFAULT_ETHERSCAN_URL,
};
use clap::Parser;
use env_logger::Env;
use eyre::{eyre, WrapErr};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

/// Decode proof verification calldata of the transactions in a CSV export
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CSV export with `Method` and `Transaction Hash` columns
    #[arg(long, default_value = "data/transactions.csv")]
    input: PathBuf,

    /// Directory the per-method output directories are created in
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,

    /// Etherscan API key
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_ETHERSCAN_URL)]
    etherscan_url: String,

    #[arg(long, default_value_t = 1)]
    chain_id: u64,

    /// Query this JSON-RPC node instead of Etherscan
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// JSON method table replacing the built-in one
    #[arg(long)]
    methods: Option<PathBuf>,

    /// Minimum delay between two requests in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,

    /// Retries on rate limiting and transient errors
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = FileNaming::Counter)]
    naming: FileNaming,
}

enum Source {
    Etherscan(EtherscanSource),
    Node(RpcNodeSource),
}

impl Args {
    fn source(&self) -> eyre::Result<Source> {
        let retry = RetryConfig::new(self.max_retries);
        if let Some(rpc_url) = &self.rpc_url {
            info!("Fetching transactions from JSON-RPC node");
            let source = RpcNodeSource::new(rpc_url)?.with_retry(retry);
            return Ok(Source::Node(source));
        }

        let api_key = self.api_key.clone().ok_or_else(|| {
            eyre!("no transaction source: pass --api-key (or set ETHERSCAN_API_KEY) or --rpc-url")
        })?;
        info!("Fetching transactions from {}", self.etherscan_url);
        let source = EtherscanSource::new(
            &self.etherscan_url,
            api_key,
            self.chain_id,
            Duration::from_secs(self.timeout_secs),
        )?
        .with_retry(retry);
        Ok(Source::Etherscan(source))
    }

    fn methods(&self) -> eyre::Result<MethodTable> {
        match &self.methods {
            Some(path) => MethodTable::from_path(path)
                .wrap_err_with(|| format!("failed to load {}", path.display())),
            None => Ok(MethodTable::builtin()?),
        }
    }
}

async fn extract<S: CalldataSource>(
    source: S,
    args: &Args,
    methods: MethodTable,
    records: &[TransactionRecord],
) -> eyre::Result<RunSummary> {
    Extractor::new(source, methods, OutputLayout::new(&args.output_dir, args.naming))
        .with_delay(Duration::from_millis(args.delay_ms))
        .run(records)
        .await
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let source = args.source()?;
    let methods = args.methods()?;
    let records = read_records(&args.input)
        .wrap_err_with(|| format!("failed to read {}", args.input.display()))?;
    info!("Read {} rows from {}", records.len(), args.input.display());

    match source {
        Source::Etherscan(source) => extract(source, &args, methods, &records).await?,
        Source::Node(source) => extract(source, &args, methods, &records).await?,
    };
    Ok(())
}
