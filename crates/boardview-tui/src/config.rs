use std::path::PathBuf;

use boardview_core::wiki::{DEFAULT_HOME, DEFAULT_PAGES};
use boardview_core::WikiNavigator;
use boardview_service::DEFAULT_ENDPOINT;
use clap::{Parser, Subcommand};

use crate::app::{AppConfig, ConnectForm};

#[derive(Debug, Parser)]
#[command(name = "boardview", about = "Project board and wiki viewer")]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// GraphQL endpoint
    #[arg(long, env = "BOARDVIEW_GRAPHQL_URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Personal access token sent as the bearer credential
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository owner
    #[arg(long, env = "BOARDVIEW_OWNER")]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long, env = "BOARDVIEW_REPO")]
    pub repo: Option<String>,

    /// Project number within the repository
    #[arg(long, env = "BOARDVIEW_PROJECT_NUMBER", value_parser = clap::value_parser!(u32).range(1..))]
    pub project_number: Option<u32>,

    /// Wiki location: an http(s) base URL or a local directory of .md files
    #[arg(long, env = "BOARDVIEW_WIKI_BASE", default_value = "../gittest-wiki.wiki")]
    pub wiki_base: String,

    /// Wiki page ids shown in the menu
    #[arg(
        long,
        env = "BOARDVIEW_WIKI_PAGES",
        value_delimiter = ',',
        default_values_t = DEFAULT_PAGES.iter().map(|p| p.to_string()).collect::<Vec<_>>()
    )]
    pub wiki_pages: Vec<String>,

    /// Page shown when no page is requested
    #[arg(long, default_value = DEFAULT_HOME)]
    pub home_page: String,

    /// Initial page, e.g. "#git-workflow"
    #[arg(long)]
    pub page: Option<String>,

    /// Fetch pages missing from --wiki-pages instead of rejecting them
    #[arg(long)]
    pub allow_unlisted_pages: bool,

    /// Write logs here (the TUI logs nowhere otherwise)
    #[arg(long, env = "BOARDVIEW_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the board once and print it as JSON
    Board,
    /// Print a wiki page rendered to HTML
    Wiki {
        /// Page id or fragment
        page: String,
        /// Print the raw markdown instead
        #[arg(long)]
        markdown: bool,
    },
}

impl Config {
    pub fn navigator(&self) -> WikiNavigator {
        WikiNavigator::new(
            self.wiki_pages.clone(),
            self.home_page.clone(),
            !self.allow_unlisted_pages,
        )
    }

    /// Connection form prefilled from flags and environment.
    pub fn connect_form(&self) -> ConnectForm {
        ConnectForm {
            token: self.token.clone().unwrap_or_default(),
            owner: self.owner.clone().unwrap_or_default(),
            repo: self.repo.clone().unwrap_or_default(),
            project_number: self
                .project_number
                .map(|n| n.to_string())
                .unwrap_or_default(),
            ..ConnectForm::default()
        }
    }

    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            form: self.connect_form(),
            navigator: self.navigator(),
            initial_fragment: self.page.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, FromArgMatches};

    use super::*;

    /// Parse `args` with every env fallback switched off, so variables
    /// exported in the caller's shell cannot leak into the result.
    fn try_parse(args: &[&str]) -> Result<Config, clap::Error> {
        let matches = Config::command()
            .mut_args(|arg| arg.env(None::<&'static str>))
            .try_get_matches_from(args.iter().copied())?;
        Config::from_arg_matches(&matches)
    }

    #[test]
    fn defaults() {
        let config = try_parse(&["boardview"]).unwrap();
        assert!(config.command.is_none());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.wiki_base, "../gittest-wiki.wiki");
        assert_eq!(config.wiki_pages.len(), DEFAULT_PAGES.len());
        assert_eq!(config.home_page, "Home");
        assert!(!config.allow_unlisted_pages);
        assert!(config.token.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn wiki_pages_split_on_commas() {
        let config = try_parse(&["boardview", "--wiki-pages", "Home,setup,faq"]).unwrap();
        assert_eq!(config.wiki_pages, vec!["Home", "setup", "faq"]);
        let nav = config.navigator();
        assert!(nav.is_listed("faq"));
        assert!(!nav.is_listed("README"));
    }

    #[test]
    fn project_number_must_be_positive() {
        assert!(try_parse(&["boardview", "--project-number", "0"]).is_err());
        assert!(try_parse(&["boardview", "--project-number", "x"]).is_err());
    }

    #[test]
    fn form_prefilled_from_flags() {
        let config = try_parse(&[
            "boardview",
            "--token",
            "ghp_x",
            "--owner",
            "octo",
            "--repo",
            "board",
            "--project-number",
            "4",
        ])
        .unwrap();
        let req = config.connect_form().to_request().unwrap();
        assert_eq!(req.token, "ghp_x");
        assert_eq!(req.owner, "octo");
        assert_eq!(req.repo, "board");
        assert_eq!(req.project_number, 4);
    }

    #[test]
    fn subcommands_parse() {
        let config = try_parse(&["boardview", "wiki", "#ci-build", "--markdown"]).unwrap();
        match config.command {
            Some(Command::Wiki { page, markdown }) => {
                assert_eq!(page, "#ci-build");
                assert!(markdown);
            }
            other => panic!("expected wiki command, got {other:?}"),
        }
        let config = try_parse(&["boardview", "board"]).unwrap();
        assert!(matches!(config.command, Some(Command::Board)));
    }

    #[test]
    fn allow_unlisted_disables_validation() {
        let config = try_parse(&["boardview", "--allow-unlisted-pages"]).unwrap();
        assert_eq!(
            config.navigator().resolve("elsewhere"),
            boardview_core::wiki::Navigation::Fetch("elsewhere".into())
        );
    }
}
