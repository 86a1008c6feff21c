use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = scentence_api::Args::parse();

	scentence_api::run(args).await
}
