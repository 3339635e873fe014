#[tokio::main]
async fn main() {
    let code = match webpilot_cli::cli::app::run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}
