use clap::{Args, Parser, Subcommand};

/// Command-line automation client for the Ammesso admissions API.
#[derive(Debug, Parser)]
#[command(name = "ammesso-cli", version, about)]
pub struct Cli {
    /// Base URL of the admissions API.
    #[arg(long, env = "AMMESSO_SITE_URL", global = true)]
    pub site: Option<String>,

    /// Bearer credential attached to every request.
    #[arg(long, env = "AMMESSO_API_TOKEN", global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// School operations.
    #[command(subcommand)]
    School(SchoolCommand),
    /// Season operations.
    #[command(subcommand)]
    Season(SeasonCommand),
}

#[derive(Debug, Subcommand)]
pub enum SchoolCommand {
    /// Fetch one school by id.
    Get {
        id: String,
    },
    /// Partially update a school; omitted fields are left untouched.
    Update(UpdateSchoolArgs),
}

#[derive(Debug, Args)]
pub struct UpdateSchoolArgs {
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long = "logo-url")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum SeasonCommand {
    /// Fetch one season by id.
    Get {
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_school_get() {
        let cli = Cli::try_parse_from([
            "ammesso-cli",
            "--site",
            "https://admissions.example.org",
            "school",
            "get",
            "school-42",
        ])
        .expect("valid invocation");

        assert_eq!(cli.site.as_deref(), Some("https://admissions.example.org"));
        match cli.command {
            Command::School(SchoolCommand::Get { id }) => assert_eq!(id, "school-42"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_school_update_with_partial_fields() {
        let cli = Cli::try_parse_from([
            "ammesso-cli",
            "school",
            "update",
            "school-42",
            "--name",
            "New Name",
        ])
        .expect("valid invocation");

        match cli.command {
            Command::School(SchoolCommand::Update(args)) => {
                assert_eq!(args.id, "school-42");
                assert_eq!(args.name.as_deref(), Some("New Name"));
                assert!(args.address.is_none());
                assert!(args.logo_url.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["ammesso-cli", "applications", "list"]).is_err());
    }
}
