use clap::Parser;
use photo_filter::args::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = photo_filter::cli_main(args).await {
        log::error!("{e:?}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
