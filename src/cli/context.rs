//! Runtime state shared by every command handler.

use std::{
    env, io,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use consign_config::{AnalyticsSettings, Config, ConfigError, ConfigManager};
use consign_domain::Ledger;
use consign_engine::{ledger_warnings, Clock, CoreError, FixedClock, LedgerStorage, ReportFilter};
use consign_storage_json::{load_ledger_from_path, save_ledger_to_path, JsonLedgerStorage, StoragePaths};

use crate::cli::{
    args::{self, ParsedArgs},
    commands,
    format::Formatter,
    output,
    registry::CommandEntry,
    registry::CommandRegistry,
    system_clock::SystemClock,
};
use crate::errors::{CliError, ConsignError};

/// Overrides the config, ledger and backup roots with `<home>/{config,ledgers,backups}`.
pub const HOME_ENV: &str = "CONSIGN_CORE_HOME";
/// Freezes the clock at midnight UTC of the given `YYYY-MM-DD` date.
pub const TODAY_ENV: &str = "CONSIGN_CORE_TODAY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    /// A single command taken from the process arguments.
    OneShot,
    /// Commands read line by line from stdin or a script file.
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No ledger open. Use `open <name>` or pass `--ledger <name>`.")]
    LedgerNotLoaded,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] ConsignError),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        CommandError::Core(err.into())
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::Core(err.into())
    }
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub storage: JsonLedgerStorage,
    pub config: Config,
    pub config_manager: ConfigManager,
    pub clock: Box<dyn Clock>,
    pub ledger: Option<Ledger>,
    /// Storage name of the open ledger; `None` when opened from a path.
    pub ledger_name: Option<String>,
    pub ledger_path: Option<PathBuf>,
    /// Forces JSON output for every command.
    pub json: bool,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let (config_manager, config, paths) = match env::var_os(HOME_ENV) {
            Some(home) => {
                let home = PathBuf::from(home);
                let manager = ConfigManager::with_base_dir(home.clone())?;
                let config = manager.load()?;
                let paths = StoragePaths {
                    ledger_root: home.join("ledgers"),
                    backup_root: home.join("backups"),
                };
                (manager, config, paths)
            }
            None => {
                let manager = ConfigManager::default_location()?;
                let config = manager.load()?;
                let paths = StoragePaths {
                    ledger_root: config.resolve_default_ledger_root(),
                    backup_root: config.resolve_default_backup_root(),
                };
                (manager, config, paths)
            }
        };
        output::set_color_enabled(config.ui_color_enabled);
        let storage = JsonLedgerStorage::new(paths)?;

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        Ok(Self {
            mode,
            registry,
            storage,
            config,
            config_manager,
            clock: clock_from_env()?,
            ledger: None,
            ledger_name: None,
            ledger_path: None,
            json: false,
            running: true,
        })
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.handler(command) else {
            self.suggest_command(raw);
            return Err(CommandError::UnknownCommand(raw.to_string()));
        };
        debug!(command, args = args.len(), "dispatching command");
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        if let Some(name) = self.registry.suggest(input) {
            output::info(format!("Suggestion: `{name}`?"));
        }
    }

    pub(crate) fn report_error(&self, err: &CommandError) {
        match err {
            CommandError::ExitRequested | CommandError::UnknownCommand(_) => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
            }
            other => output::error(other),
        }
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::from_config(&self.config)
    }

    pub fn analytics(&self) -> &AnalyticsSettings {
        &self.config.analytics
    }

    /// Filter from the command's options, carrying the configured payout rule.
    pub fn report_filter(&self, parsed: &ParsedArgs) -> Result<ReportFilter, CommandError> {
        let filter = args::report_filter(self.ledger()?, parsed)?;
        Ok(filter.payout_readiness(self.config.analytics.payout_readiness))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Opens a ledger by storage name, or by file path when `target` names a file.
    pub fn open_ledger(&mut self, target: &str) -> Result<&Ledger, CommandError> {
        let path = Path::new(target);
        let warnings = if path.is_file() {
            let ledger = load_ledger_from_path(path)?;
            let warnings = ledger_warnings(&ledger);
            self.ledger = Some(ledger);
            self.ledger_name = None;
            self.ledger_path = Some(path.to_path_buf());
            warnings
        } else {
            let (ledger, warnings) = self.storage.load_checked(target)?;
            self.ledger = Some(ledger);
            self.ledger_name = Some(target.to_string());
            self.ledger_path = Some(self.storage.ledger_path(target));
            if self.config.last_opened_ledger.as_deref() != Some(target) {
                self.config.last_opened_ledger = Some(target.to_string());
                self.config_manager.save(&self.config)?;
            }
            warnings
        };
        for warning in &warnings {
            output::warning(warning);
        }
        info!(ledger = target, "opened ledger");
        self.ledger.as_ref().ok_or(CommandError::LedgerNotLoaded)
    }

    /// Makes sure a ledger is open, reopening the last one used when none is.
    pub fn ensure_ledger(&mut self) -> CommandResult {
        if self.ledger.is_none() {
            let last = self
                .config
                .last_opened_ledger
                .clone()
                .ok_or(CommandError::LedgerNotLoaded)?;
            self.open_ledger(&last)?;
        }
        Ok(())
    }

    pub fn ledger(&self) -> Result<&Ledger, CommandError> {
        self.ledger.as_ref().ok_or(CommandError::LedgerNotLoaded)
    }

    pub fn ledger_mut(&mut self) -> Result<&mut Ledger, CommandError> {
        self.ledger.as_mut().ok_or(CommandError::LedgerNotLoaded)
    }

    /// Writes the open ledger back to where it was loaded from.
    pub fn persist(&self) -> CommandResult {
        let ledger = self.ledger.as_ref().ok_or(CommandError::LedgerNotLoaded)?;
        match (&self.ledger_name, &self.ledger_path) {
            (Some(name), _) => self.storage.save_ledger(name, ledger)?,
            (None, Some(path)) => save_ledger_to_path(ledger, path)?,
            (None, None) => return Err(CommandError::LedgerNotLoaded),
        }
        debug!(ledger = %ledger.name, "ledger persisted");
        Ok(())
    }
}

fn clock_from_env() -> Result<Box<dyn Clock>, CliError> {
    match env::var(TODAY_ENV) {
        Ok(value) => {
            let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|err| {
                CliError::Input(format!("{TODAY_ENV} must be YYYY-MM-DD: {err}"))
            })?;
            Ok(Box::new(FixedClock::on(date)))
        }
        Err(_) => Ok(Box::new(SystemClock)),
    }
}
