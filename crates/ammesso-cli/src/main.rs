mod args;
mod client;

use clap::Parser;
use serde::Serialize;

use ammesso_api_types::{School, SchoolPatch, Season};

use crate::args::{Cli, Command, SchoolCommand, SeasonCommand, UpdateSchoolArgs};
use crate::client::{CliError, Ctx};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let site = cli.site.ok_or(CliError::MissingSite)?;
    let ctx = Ctx::new(&site, cli.token)?;

    match cli.command {
        Command::School(SchoolCommand::Get { id }) => {
            let school: School = ctx.get(&format!("api/v1/schools/{id}")).await?;
            print_json(&school)
        }
        Command::School(SchoolCommand::Update(args)) => update_school(&ctx, args).await,
        Command::Season(SeasonCommand::Get { id }) => {
            let season: Season = ctx.get(&format!("api/v1/seasons/{id}")).await?;
            print_json(&season)
        }
    }
}

async fn update_school(ctx: &Ctx, args: UpdateSchoolArgs) -> Result<(), CliError> {
    let mut patch = SchoolPatch::default();
    patch.name = args.name;
    patch.address = args.address;
    patch.logo_url = args.logo_url;

    let body =
        serde_json::to_value(&patch).map_err(|err| CliError::Decode(err.to_string()))?;
    let school: School = ctx.patch(&format!("api/v1/schools/{}", args.id), body).await?;
    print_json(&school)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| CliError::Decode(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}
