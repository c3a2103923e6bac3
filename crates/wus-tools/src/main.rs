//! wus CLI - Bootstraps a Serverless (AppSync) + Next.js SaaS workspace

use std::path::Path;

use anyhow::Result;
use bootstrap_core::flow::{self, InitArgs};
use bootstrap_core::options::{CliOptions, SHARED_HOSTING_DOMAIN};
use bootstrap_core::StackConfig;
use clap::{CommandFactory, Parser};
use colored::Colorize;

/// wus product configuration
#[derive(Clone)]
pub struct WusConfig;

impl StackConfig for WusConfig {
    fn name(&self) -> &'static str {
        "wus"
    }

    fn display_name(&self) -> &'static str {
        "Work-U SaaS"
    }

    fn asset_bundle_url(&self) -> &'static str {
        "https://github.com/thedevopsguyblog/wus/archive/refs/heads/main.zip"
    }

    fn asset_url_env(&self) -> &'static str {
        "WUS_ASSET_URL"
    }

    fn connectivity_probe_url(&self) -> &'static str {
        "https://registry.npmjs.org"
    }

    fn frontend_template_repo(&self) -> &'static str {
        "https://github.com/nextui-org/next-app-template"
    }

    fn cli_description(&self) -> &'static str {
        "CLI for bootstrapping Serverless (AppSync) + Next.js SaaS workspaces"
    }

    fn next_steps(&self, dir: &Path) -> Vec<String> {
        vec![
            format!("cd {}", dir.display()),
            "npm run dev:fullstack".to_string(),
            "Start building your Serverless (AppSync) + NextJS SaaS".to_string(),
        ]
    }
}

#[derive(Parser, Debug)]
#[command(name = "wus")]
#[command(about = "CLI for bootstrapping Serverless (AppSync) + Next.js SaaS workspaces")]
#[command(version)]
pub struct Args {
    /// The name of the application, eg: 'My SaaS App'
    #[arg(short = 'a', long = "APP_NAME")]
    pub app_name: Option<String>,

    /// The code for the application, eg: 'MSA'
    #[arg(short = 'c', long = "APP_CODE")]
    pub app_code: Option<String>,

    /// The domain name for the application, eg: 'my-saas-app.com'
    #[arg(short = 'd', long = "DOMAINNAME", default_value = SHARED_HOSTING_DOMAIN)]
    pub domain_name: String,

    /// GitHub owner of the application repository
    #[arg(long = "GH_OWNER", visible_alias = "go")]
    pub gh_owner: Option<String>,

    /// GitHub repository of the application
    #[arg(long = "GH_REPO", visible_alias = "gr")]
    pub gh_repo: Option<String>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();

    let (Some(app_name), Some(app_code)) = (args.app_name.clone(), args.app_code.clone()) else {
        eprintln!("{}", "Please provide all the required arguments".yellow());
        Args::command().print_help()?;
        std::process::exit(1);
    };

    if args.gh_owner.is_none() || args.gh_repo.is_none() {
        eprintln!(
            "{}",
            "Hint: pass --GH_OWNER and --GH_REPO to link \"git@github.com:<owner>/<repo>.git\""
                .dimmed()
        );
    }

    let options = match CliOptions::new(app_name, app_code, args.domain_name.clone()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e.to_string().yellow());
            Args::command().print_help()?;
            std::process::exit(1);
        }
    };

    let config = WusConfig;
    let result = flow::run(&config, InitArgs { options, yes: args.yes }).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    if let Err(e) = result {
        eprintln!("{}", format!("{:#}", e).red());
        std::process::exit(1);
    }

    Ok(())
}
