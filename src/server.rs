use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, error, info};
use parking_lot::RwLock;
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::checker::Checker;
use crate::commands::{self, SpellCommand, WordTarget};
use crate::config::Config;
use crate::dictionary::{AddOutcome, DictionaryStore};
use crate::document::TextDocument;
use crate::expander::split_compound_word;
use crate::report::{self, Finding, FindingData};

pub const DIAGNOSTIC_SOURCE: &str = "minispell";

pub struct Backend {
    client: Client,
    config: RwLock<Config>,
    /// Overrides whatever folder the client settings name.
    folder_override: Option<PathBuf>,
    store: RwLock<Arc<DictionaryStore>>,
    documents: DashMap<Url, TextDocument>,
}

impl Backend {
    pub fn new(client: Client, config: Config, folder_override: Option<PathBuf>) -> Self {
        let store = build_store(&config, folder_override.as_ref());
        Self {
            client,
            config: RwLock::new(config),
            folder_override,
            store: RwLock::new(Arc::new(store)),
            documents: DashMap::new(),
        }
    }

    fn store(&self) -> Arc<DictionaryStore> {
        self.store.read().clone()
    }

    fn checker(&self) -> Checker {
        Checker::new(self.store())
    }

    /// Swaps in new settings, rebuilding the store only when the folder or
    /// cooldown changed.
    async fn apply_config(&self, config: Config) {
        let current = self.store();
        let folder = self
            .folder_override
            .clone()
            .unwrap_or_else(|| config.dictionary_folder());
        if current.folder() != folder.as_path() || current.cooldown() != config.cooldown() {
            info!("dictionary folder is now {folder:?}");
            let store = Arc::new(build_store(&config, self.folder_override.as_ref()));
            store.clone().reload(true).await;
            *self.store.write() = store;
        } else {
            current.reload(false).await;
        }
        *self.config.write() = config;
    }

    async fn check_document(&self, uri: Url) {
        let Some((text, language_id, version)) = self
            .documents
            .get(&uri)
            .map(|doc| (doc.text(), doc.language_id.clone(), doc.version))
        else {
            return;
        };

        let config = self.config.read().clone();
        if !config.should_check(&language_id) {
            debug!("not checking {uri} ({language_id})");
            self.client.publish_diagnostics(uri, vec![], Some(version)).await;
            return;
        }

        self.store().reload(false).await;
        let findings = report::report(self.checker().scan(&text), config.diagnostic_severity);
        let diagnostics = findings.iter().map(to_diagnostic).collect::<Vec<_>>();
        debug!("{} findings in {uri}", diagnostics.len());

        self.client
            .publish_diagnostics(uri, diagnostics, Some(version))
            .await;
    }

    async fn check_all_documents(&self) {
        let uris = self
            .documents
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();
        for uri in uris {
            self.check_document(uri).await;
        }
    }

    fn word_at(&self, uri: &Url, position: Position) -> Option<String> {
        self.documents.get(uri).and_then(|doc| doc.word_at(position))
    }

    async fn add_word(&self, target: Option<WordTarget>) -> Option<Value> {
        let Some(word) = target.and_then(|t| t.resolve(|uri, pos| self.word_at(uri, pos))) else {
            self.client
                .show_message(MessageType::ERROR, "No word selected or cursor not on a word.")
                .await;
            return None;
        };

        match self.store().add_word(&word).await {
            Ok(AddOutcome::Added(word)) => {
                self.check_all_documents().await;
                Some(Value::String(word))
            }
            Ok(outcome @ AddOutcome::AlreadyPresent(_)) => {
                let message = format!("\"{}\" is already in the user dictionary.", outcome.word());
                self.client.show_message(MessageType::INFO, message).await;
                None
            }
            Err(err) => {
                error!("{err}");
                self.client
                    .show_message(MessageType::ERROR, format!("Failed to add word: {err}"))
                    .await;
                None
            }
        }
    }

    async fn export(&self, path: PathBuf) -> Option<Value> {
        match self.store().export_user_dictionary(&path).await {
            Ok(count) => {
                let message = format!(
                    "User dictionary exported successfully to {} ({count} words)",
                    path.display()
                );
                self.client.show_message(MessageType::INFO, message).await;
                Some(Value::from(count))
            }
            Err(err) => {
                error!("{err}");
                self.client
                    .show_message(
                        MessageType::ERROR,
                        format!("Failed to export dictionary: {err}"),
                    )
                    .await;
                None
            }
        }
    }

    fn code_actions_for(&self, uri: &Url, diagnostic: &Diagnostic) -> Vec<CodeActionOrCommand> {
        let actions = code_actions(&self.checker(), diagnostic);
        debug!("{} code actions for {uri}", actions.len());
        actions
    }
}

/// Quick fixes for one of our diagnostics: add the whole word, and for a
/// compound each part the dictionaries still lack.
pub fn code_actions(checker: &Checker, diagnostic: &Diagnostic) -> Vec<CodeActionOrCommand> {
    let Some(data) = finding_data(diagnostic) else {
        return vec![];
    };
    let quick_fix = |command: Command| {
        CodeActionOrCommand::CodeAction(CodeAction {
            title: command.title.clone(),
            kind: Some(CodeActionKind::QUICKFIX),
            diagnostics: Some(vec![diagnostic.clone()]),
            command: Some(command),
            ..Default::default()
        })
    };

    let mut actions = vec![quick_fix(commands::add_to_dictionary(&data.compound))];

    if split_compound_word(&data.compound).len() > 1 {
        for part in checker.unknown_parts(&data.compound) {
            let mut command = commands::add_to_dictionary(&part);
            command.title = format!("Add part \"{part}\" to dictionary");
            actions.push(quick_fix(command));
        }
    }
    actions
}

fn build_store(config: &Config, folder_override: Option<&PathBuf>) -> DictionaryStore {
    let folder = folder_override
        .cloned()
        .unwrap_or_else(|| config.dictionary_folder());
    DictionaryStore::with_cooldown(folder, config.cooldown())
}

pub fn to_diagnostic(finding: &Finding) -> Diagnostic {
    let range = Range {
        start: Position::new(finding.location.start.line(), finding.location.start.column()),
        end: Position::new(finding.location.end.line(), finding.location.end.column()),
    };
    Diagnostic {
        range,
        severity: Some(finding.severity.to_lsp_diagnostic()),
        code: Some(NumberOrString::String(finding.data.compound.clone())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: finding.message.clone(),
        data: serde_json::to_value(&finding.data).ok(),
        ..Default::default()
    }
}

/// Recovers the finding payload from one of our diagnostics, falling back to
/// the code for clients that drop `data`.
fn finding_data(diagnostic: &Diagnostic) -> Option<FindingData> {
    if diagnostic.source.as_deref() != Some(DIAGNOSTIC_SOURCE) {
        return None;
    }
    if let Some(data) = diagnostic
        .data
        .clone()
        .and_then(|d| serde_json::from_value::<FindingData>(d).ok())
    {
        return Some(data);
    }
    match &diagnostic.code {
        Some(NumberOrString::String(compound)) => Some(FindingData {
            compound: compound.clone(),
            unknown_parts: vec![],
        }),
        _ => None,
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options {
            let config = Config::from_value(options);
            let store = build_store(&config, self.folder_override.as_ref());
            *self.store.write() = Arc::new(store);
            *self.config.write() = config;
        }
        self.store().reload(true).await;

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: DIAGNOSTIC_SOURCE.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            offset_encoding: None,
            capabilities: ServerCapabilities {
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        ..Default::default()
                    },
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: commands::all(),
                    work_done_progress_options: Default::default(),
                }),
                ..ServerCapabilities::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        debug!("initialized!");
    }

    async fn shutdown(&self) -> Result<()> {
        debug!("shutdown!");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        debug!("file opened {} ({})", doc.uri, doc.language_id);
        self.documents.insert(
            doc.uri.clone(),
            TextDocument::new(doc.language_id, doc.version, &doc.text),
        );
        self.check_document(doc.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let known = match self.documents.get_mut(&uri) {
            Some(mut doc) => {
                doc.apply_changes(params.text_document.version, params.content_changes);
                true
            }
            None => false,
        };
        if !known {
            debug!("change for unknown document {uri}");
            return;
        }
        self.check_document(uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.remove(&uri);
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        info!("configuration changed");
        let config = self.config.read().merged(params.settings);
        self.apply_config(config).await;
        self.check_all_documents().await;
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = &params.text_document.uri;
        let actions = params
            .context
            .diagnostics
            .iter()
            .flat_map(|d| self.code_actions_for(uri, d))
            .collect::<Vec<_>>();
        if actions.is_empty() {
            return Ok(None);
        }
        Ok(Some(actions))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        debug!("command executed: {}", params.command);

        match SpellCommand::parse(&params.command, &params.arguments)? {
            SpellCommand::Reload => {
                self.store().reload(true).await;
                self.check_all_documents().await;
                self.client
                    .show_message(MessageType::INFO, "Dictionaries reloaded successfully.")
                    .await;
                Ok(None)
            }
            SpellCommand::AddWord(target) => Ok(self.add_word(target).await),
            SpellCommand::Export(path) => Ok(self.export(path).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::CheckResult;
    use crate::config::Severity;
    use crate::lexer::Lexer;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn finding() -> Finding {
        let token = Lexer::new("a\n  helo wrld").nth(1).unwrap();
        Finding::from_result(
            CheckResult {
                token,
                unknown_parts: vec!["helo".to_string()],
            },
            Severity::Warning,
        )
    }

    #[test]
    fn diagnostic_from_finding() {
        let diagnostic = to_diagnostic(&finding());
        assert_eq!(diagnostic.range, Range::new(Position::new(1, 2), Position::new(1, 6)));
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diagnostic.source.as_deref(), Some(DIAGNOSTIC_SOURCE));
        assert_eq!(diagnostic.message, "Unknown word part: \"helo\" in \"helo\"");
        assert_eq!(
            diagnostic.data,
            Some(json!({ "compound": "helo", "unknownParts": ["helo"] }))
        );
    }

    #[test]
    fn finding_data_round_trips_through_diagnostics() {
        let diagnostic = to_diagnostic(&finding());
        let data = finding_data(&diagnostic).unwrap();
        assert_eq!(data.compound, "helo");
        assert_eq!(data.unknown_parts, vec!["helo"]);
    }

    #[test]
    fn finding_data_falls_back_to_code() {
        let mut diagnostic = to_diagnostic(&finding());
        diagnostic.data = None;
        assert_eq!(finding_data(&diagnostic).unwrap().compound, "helo");

        diagnostic.source = Some("other".to_string());
        assert!(finding_data(&diagnostic).is_none());
    }

    fn diagnostic_for(text: &str, known: &[&str]) -> (TempDir, Checker, Diagnostic) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("dictionary.txt"), known.join("\n")).unwrap();
        let store = Arc::new(DictionaryStore::new(dir.path()));
        store.load_all(true);
        let checker = Checker::new(store);
        let result = checker.scan(text).into_iter().next().unwrap();
        let diagnostic = to_diagnostic(&Finding::from_result(result, Severity::Warning));
        (dir, checker, diagnostic)
    }

    fn titles(actions: &[CodeActionOrCommand]) -> Vec<String> {
        actions
            .iter()
            .map(|action| match action {
                CodeActionOrCommand::CodeAction(action) => action.title.clone(),
                CodeActionOrCommand::Command(command) => command.title.clone(),
            })
            .collect()
    }

    #[test]
    fn compound_gets_whole_word_and_part_fixes() {
        let (_dir, checker, diagnostic) = diagnostic_for("userNmae", &["user"]);
        let actions = code_actions(&checker, &diagnostic);
        assert_eq!(
            titles(&actions),
            vec!["Add \"userNmae\" to dictionary", "Add part \"nmae\" to dictionary"]
        );

        let CodeActionOrCommand::CodeAction(part) = &actions[1] else {
            panic!("expected a code action");
        };
        assert_eq!(part.kind, Some(CodeActionKind::QUICKFIX));
        assert_eq!(part.diagnostics, Some(vec![diagnostic.clone()]));
        let command = part.command.as_ref().unwrap();
        assert_eq!(command.command, commands::COMMAND_ADD_TO_USER_DICTIONARY);
        assert_eq!(command.arguments, Some(vec![json!("nmae")]));
    }

    #[test]
    fn simple_word_gets_one_fix() {
        let (_dir, checker, diagnostic) = diagnostic_for("helo", &["hello"]);
        let actions = code_actions(&checker, &diagnostic);
        assert_eq!(titles(&actions), vec!["Add \"helo\" to dictionary"]);
    }

    #[test]
    fn foreign_diagnostics_get_no_fixes() {
        let (_dir, checker, mut diagnostic) = diagnostic_for("helo", &[]);
        diagnostic.source = Some("rustc".to_string());
        assert!(code_actions(&checker, &diagnostic).is_empty());
    }
}
