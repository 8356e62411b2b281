use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

use crate::contact::CountryCode;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "rolo";

const DEFAULT_LOAD_DELAY_MS: u64 = 800;
const DEFAULT_REMOVE_DELAY_MS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    /// The file the configuration came from, if one existed.
    pub config_path: Option<PathBuf>,
    pub default_country: CountryCode,
    /// Simulated load delay before the list becomes interactive.
    pub load_delay: Duration,
    /// Delay between marking a contact pending removal and removing it.
    pub remove_delay: Duration,
    /// Start with the sample roster instead of an empty one.
    pub seed_roster: bool,
    pub keys: Keys,
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            default_country: CountryCode::UsCa,
            load_delay: Duration::from_millis(DEFAULT_LOAD_DELAY_MS),
            remove_delay: Duration::from_millis(DEFAULT_REMOVE_DELAY_MS),
            seed_roster: true,
            keys: Keys::default(),
            ui: UiConfig::default(),
        }
    }
}

// =============================================================================
// UI configuration
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
    pub error_fg: RgbColor,
}

impl Default for UiColors {
    fn default() -> Self {
        Self {
            border: RgbColor::new(167, 139, 250),
            selection_bg: RgbColor::new(167, 139, 250),
            selection_fg: RgbColor::new(0, 0, 0),
            status_fg: RgbColor::new(167, 139, 250),
            status_bg: RgbColor::new(0, 0, 0),
            error_fg: RgbColor::new(239, 68, 68),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

// =============================================================================
// Key bindings - context-aware with multiple bindings per action
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Keys {
    /// Keys that work outside the form.
    pub global: GlobalKeys,
    /// Keys for browsing the contact list.
    pub list: ListKeys,
    /// Keys inside the add-contact form.
    pub form: FormKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub search: Vec<String>,
    pub add: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ListKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub delete: Vec<String>,
    pub clear: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FormKeys {
    pub submit: Vec<String>,
    pub cancel: Vec<String>,
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["q".into()],
            search: vec!["/".into()],
            add: vec!["a".into()],
        }
    }
}

impl Default for ListKeys {
    fn default() -> Self {
        Self {
            next: vec!["j".into(), "Down".into(), "Tab".into()],
            prev: vec!["k".into(), "Up".into(), "Backtab".into()],
            delete: vec!["x".into(), "Delete".into()],
            clear: vec!["Escape".into()],
        }
    }
}

impl Default for FormKeys {
    fn default() -> Self {
        Self {
            submit: vec!["Enter".into()],
            cancel: vec!["Escape".into()],
            next_field: vec!["Tab".into(), "Down".into()],
            prev_field: vec!["Backtab".into(), "Up".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    list: ListKeysFile,
    form: FormKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    search: KeyBinding,
    add: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            search: KeyBinding::Multiple(defaults.search),
            add: KeyBinding::Multiple(defaults.add),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ListKeysFile {
    next: KeyBinding,
    prev: KeyBinding,
    delete: KeyBinding,
    clear: KeyBinding,
}

impl Default for ListKeysFile {
    fn default() -> Self {
        let defaults = ListKeys::default();
        Self {
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            delete: KeyBinding::Multiple(defaults.delete),
            clear: KeyBinding::Multiple(defaults.clear),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FormKeysFile {
    submit: KeyBinding,
    cancel: KeyBinding,
    next_field: KeyBinding,
    prev_field: KeyBinding,
}

impl Default for FormKeysFile {
    fn default() -> Self {
        let defaults = FormKeys::default();
        Self {
            submit: KeyBinding::Multiple(defaults.submit),
            cancel: KeyBinding::Multiple(defaults.cancel),
            next_field: KeyBinding::Multiple(defaults.next_field),
            prev_field: KeyBinding::Multiple(defaults.prev_field),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: GlobalKeys {
                quit: file.global.quit.into_vec(),
                search: file.global.search.into_vec(),
                add: file.global.add.into_vec(),
            },
            list: ListKeys {
                next: file.list.next.into_vec(),
                prev: file.list.prev.into_vec(),
                delete: file.list.delete.into_vec(),
                clear: file.list.clear.into_vec(),
            },
            form: FormKeys {
                submit: file.form.submit.into_vec(),
                cancel: file.form.cancel.into_vec(),
                next_field: file.form.next_field.into_vec(),
                prev_field: file.form.prev_field.into_vec(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
    error_fg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        let defaults = UiColors::default();
        Self {
            border: defaults.border,
            selection_bg: defaults.selection_bg,
            selection_fg: defaults.selection_fg,
            status_fg: defaults.status_fg,
            status_bg: defaults.status_bg,
            error_fg: defaults.error_fg,
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
                error_fg: file.colors.error_fg,
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    default_country: Option<String>,
    load_delay_ms: Option<u64>,
    remove_delay_ms: Option<u64>,
    seed_roster: Option<bool>,
    keys: KeysFile,
    ui: UiFile,
}

// =============================================================================
// Loading
// =============================================================================

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration.
///
/// With an explicit path the file must exist. Without one, a missing
/// file at the default location silently yields the defaults.
pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let mut config = parse(&raw).with_context(|| format!("in {}", path.display()))?;
    config.config_path = Some(path);
    Ok(config)
}

fn parse(raw: &str) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse TOML")?;

    for warning in unknown_keys(&value) {
        eprintln!("warning: {}", warning);
    }

    let cfg_file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;

    let default_country = match cfg_file.default_country.as_deref() {
        Some(dial) => CountryCode::from_dial(dial).with_context(|| {
            format!(
                "invalid default_country '{}', expected one of: {}",
                dial,
                CountryCode::ALL.map(CountryCode::dial).join(", ")
            )
        })?,
        None => CountryCode::UsCa,
    };

    Ok(Config {
        config_path: None,
        default_country,
        load_delay: Duration::from_millis(cfg_file.load_delay_ms.unwrap_or(DEFAULT_LOAD_DELAY_MS)),
        remove_delay: Duration::from_millis(
            cfg_file.remove_delay_ms.unwrap_or(DEFAULT_REMOVE_DELAY_MS),
        ),
        seed_roster: cfg_file.seed_roster.unwrap_or(true),
        keys: cfg_file.keys.into(),
        ui: cfg_file.ui.into(),
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

/// Collect warnings for keys the configuration schema does not know.
/// Unknown keys never fail the load; they usually mean a typo.
fn unknown_keys(value: &toml::Value) -> Vec<String> {
    let mut warnings = Vec::new();
    let Some(table) = value.as_table() else {
        return warnings;
    };

    let known = HashSet::from([
        "default_country",
        "load_delay_ms",
        "remove_delay_ms",
        "seed_roster",
        "keys",
        "ui",
    ]);

    for key in table.keys() {
        if !known.contains(key.as_str()) {
            warnings.push(format!("unknown configuration key `{}`", key));
        }
    }

    if let Some(keys_val) = table.get("keys") {
        unknown_keys_section(keys_val, &mut warnings);
    }

    if let Some(ui_val) = table.get("ui") {
        unknown_ui_keys(ui_val, &mut warnings);
    }

    warnings
}

fn unknown_keys_section(value: &toml::Value, warnings: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known_contexts = HashSet::from(["global", "list", "form"]);
    for key in table.keys() {
        if !known_contexts.contains(key.as_str()) {
            warnings.push(format!("unknown keys.* context `{}`", key));
        }
    }

    if let Some(v) = table.get("global") {
        unknown_in_context(v, "global", &["quit", "search", "add"], warnings);
    }
    if let Some(v) = table.get("list") {
        unknown_in_context(v, "list", &["next", "prev", "delete", "clear"], warnings);
    }
    if let Some(v) = table.get("form") {
        unknown_in_context(
            v,
            "form",
            &["submit", "cancel", "next_field", "prev_field"],
            warnings,
        );
    }
}

fn unknown_in_context(value: &toml::Value, context: &str, known: &[&str], warnings: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known_set: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known_set.contains(key.as_str()) {
            warnings.push(format!("unknown keys.{}.* entry `{}`", context, key));
        }
    }
}

fn unknown_ui_keys(value: &toml::Value, warnings: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };

    for key in table.keys() {
        if key != "colors" {
            warnings.push(format!("unknown ui.* entry `{}`", key));
        }
    }

    if let Some(colors_val) = table.get("colors") {
        let Some(colors) = colors_val.as_table() else {
            return;
        };
        let known = HashSet::from([
            "border",
            "selection_bg",
            "selection_fg",
            "status_fg",
            "status_bg",
            "error_fg",
        ]);
        for key in colors.keys() {
            if !known.contains(key.as_str()) {
                warnings.push(format!("unknown ui.colors entry `{}`", key));
            }
        }
    }
}
