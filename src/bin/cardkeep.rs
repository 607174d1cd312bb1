use anyhow::Result;
use cardkeep::cli::{
    actions::{server, Action},
    start,
};

#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;

    match action {
        Action::Server(args) => server::execute(args).await?,
    }

    Ok(())
}
