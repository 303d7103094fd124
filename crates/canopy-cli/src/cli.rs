use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "canopy",
    about = "Canopy: sync a local directory into a versioned tree",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Canopy home directory (defaults to $CANOPY_HOME or the platform data dir)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Link the current directory to a new directory in the target tree
    Init(InitArgs),
    /// Show differences between the latest version and the current directory
    Status(StatusArgs),
    /// Write a snapshot of the current directory as a new version
    Commit(CommitArgs),
    /// Print a file from the target tree
    Cat(CatArgs),
    /// List a directory of the target tree
    Ls(LsArgs),
    /// Show a directory of the target tree as a tree
    Tree(TreeArgs),
    /// Show version history
    Log(LogArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Name of the target directory (defaults to the current directory's name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct CatArgs {
    pub path: String,
}

#[derive(Args)]
pub struct LsArgs {
    pub path: Option<String>,
}

#[derive(Args)]
pub struct TreeArgs {
    #[arg(default_value = "public")]
    pub path: String,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["canopy", "init"]).unwrap();
        if let Command::Init(args) = cli.command {
            assert!(args.name.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_init_with_name() {
        let cli = Cli::try_parse_from(["canopy", "init", "--name", "site"]).unwrap();
        if let Command::Init(args) = cli.command {
            assert_eq!(args.name.as_deref(), Some("site"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["canopy", "status"]).unwrap();
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn parse_commit() {
        let cli = Cli::try_parse_from(["canopy", "commit", "-m", "publish notes"]).unwrap();
        if let Command::Commit(args) = cli.command {
            assert_eq!(args.message.as_deref(), Some("publish notes"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_cat_requires_path() {
        assert!(Cli::try_parse_from(["canopy", "cat"]).is_err());
        let cli = Cli::try_parse_from(["canopy", "cat", "public/a.txt"]).unwrap();
        assert!(matches!(cli.command, Command::Cat(CatArgs { path }) if path == "public/a.txt"));
    }

    #[test]
    fn parse_ls_optional_path() {
        let cli = Cli::try_parse_from(["canopy", "ls"]).unwrap();
        assert!(matches!(cli.command, Command::Ls(LsArgs { path: None })));
    }

    #[test]
    fn parse_tree_defaults_to_public() {
        let cli = Cli::try_parse_from(["canopy", "tree"]).unwrap();
        if let Command::Tree(args) = cli.command {
            assert_eq!(args.path, "public");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_log_limit() {
        let cli = Cli::try_parse_from(["canopy", "log", "-n", "5"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert_eq!(args.limit, 5);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "canopy", "status", "--verbose", "--format", "json", "--home", "/tmp/canopy",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/canopy")));
    }
}
