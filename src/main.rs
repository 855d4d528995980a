use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use config::Config;
use log::{error, info};
use server::Backend;
use tower_lsp::{LspService, Server};

mod checker;
mod cli;
mod commands;
mod config;
mod dictionary;
mod document;
mod expander;
mod lexer;
mod local_dictionary;
mod report;
mod server;

#[derive(Parser, Debug)]
#[command(version, about = "Flags unknown words and keeps a personal dictionary")]
struct Args {
    /// Folder holding dictionary*.txt and userDictionary.txt
    #[arg(long, global = true)]
    dictionary_folder: Option<PathBuf>,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Run the language server on stdio (default)
    Serve,
    /// Check files and print what is unknown
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Language id to check the files as, instead of guessing from the extension
        #[arg(long)]
        language: Option<String>,
    },
    /// Add a word to the user dictionary
    Add { word: String },
    /// Write the user dictionary to a file
    Export { path: PathBuf },
}

async fn serve(config: Config, folder_override: Option<PathBuf>) {
    let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());

    let (service, socket) =
        LspService::new(|client| Backend::new(client, config, folder_override));

    info!("Started language server");
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                return ExitCode::from(2);
            }
        },
        None => Config::default(),
    };

    match args.command.unwrap_or(Action::Serve) {
        Action::Serve => {
            serve(config, args.dictionary_folder).await;
            ExitCode::SUCCESS
        }
        Action::Check { files, language } => {
            let store = cli::store_for(&config, args.dictionary_folder);
            cli::check(store, &config, &files, language.as_deref())
        }
        Action::Add { word } => {
            let store = cli::store_for(&config, args.dictionary_folder);
            cli::add(store, &word).await
        }
        Action::Export { path } => {
            let store = cli::store_for(&config, args.dictionary_folder);
            cli::export(store, &path).await
        }
    }
}
