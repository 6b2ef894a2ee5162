use clap::Parser;
use color_eyre::{Result, eyre::WrapErr as _};
use engine::{
    config::{Credentials, Settings},
    image_model::Provider,
    output,
};

/// Sends a raw JSON input to a model and prints the image URLs it returns
#[derive(clap::Parser)]
struct Arg {
    provider: Provider,
    model: String,
    input: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    let Arg {
        provider,
        model,
        input,
    } = Arg::parse();
    let input = serde_json::from_str(&input).wrap_err("input is not valid JSON")?;

    let settings = Settings::load(None)?;
    let key = Credentials::from_env().key_for(provider)?;
    let raw = provider.make(key, &settings).run(&model, &input).await?;

    let urls = output::image_urls(&raw);
    if urls.is_empty() {
        println!("No image URLs in output:\n{raw:#}");
    }
    for url in urls {
        println!("{url}");
    }
    Ok(())
}
