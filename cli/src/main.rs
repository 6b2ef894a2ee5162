use clap::Parser;
use color_eyre::Result;
use engine::error::SetupError;
use pixel_forge::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let Err(e) = pixel_forge::run(Cli::parse()).await else {
        return Ok(());
    };
    match e.downcast_ref::<SetupError>() {
        Some(setup) => {
            println!("{setup}");
            if let SetupError::MissingCredential { .. } = setup {
                println!(
                    "{}",
                    indoc::indoc! {"
                        Credentials are read from the environment or from a .env file in the
                        working directory, e.g.
                            REPLICATE_API_TOKEN=r8_...
                            FAL_KEY=...
                    "}
                );
            }
            std::process::exit(1)
        }
        None => Err(e),
    }
}
