//! CLI: pattern → (shape | groups), case files → batch outcomes
use std::path::{Path, PathBuf};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use preg_shape::batch::{self, Outcome};
use preg_shape::{Config, Expr, GroupTyping, MapScope, MatchMode, PhpVersion, RegexShapeMatcher, Trinary, Type};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// predict the `$matches` array shape of preg_match / preg_match_all calls
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the result type of one call
    Shape(ShapeOut),
    /// dump the capture-group model of a pattern as JSON
    Groups(GroupsOut),
    /// evaluate a JSON/NDJSON file of call sites
    Batch(BatchOut),
}

#[derive(Args, Debug, Clone)]
struct ConfigSettings {
    /// JSON configuration file (`php_version`, `group_types`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// target PHP version, e.g. 8.1 or 70300 (overrides the config file)
    #[arg(long)]
    php_version: Option<PhpVersion>,

    /// group value typing (overrides the config file)
    #[arg(long, value_enum)]
    group_types: Option<GroupTyping>,
}

#[derive(clap::Parser, Debug)]
struct ShapeOut {
    #[command(flatten)]
    config_settings: ConfigSettings,

    /// one or more delimited patterns; several mean "any of these"
    #[arg(num_args = 1.., required = true)]
    pattern: Vec<String>,

    /// flags expression, e.g. 'PREG_SET_ORDER | PREG_OFFSET_CAPTURE' or 256
    #[arg(long)]
    flags: Option<String>,

    #[arg(long, value_enum, default_value_t = MatchMode::One)]
    mode: MatchMode,

    /// whether the call is known to have matched
    #[arg(long, value_enum, default_value_t = Trinary::Yes)]
    matched: Trinary,

    /// print `{"type": ...}` instead of the bare type
    #[arg(long)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct GroupsOut {
    #[command(flatten)]
    config_settings: ConfigSettings,

    pattern: String,
}

#[derive(clap::Parser, Debug)]
struct BatchOut {
    #[command(flatten)]
    config_settings: ConfigSettings,

    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ConfigSettings {
    fn load(&self) -> anyhow::Result<Config> {
        let mut config = match self.config.as_ref() {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(version) = self.php_version {
            config.php_version = version;
        }
        if let Some(typing) = self.group_types {
            config.group_types = typing;
        }
        Ok(config)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Shape(target) => target.run(),
            Command::Groups(target) => {
                let config = target.config_settings.load()?;
                let parsed = preg_shape::parse_groups(&target.pattern, config.group_types)
                    .with_context(|| format!("cannot parse {}", target.pattern))?;
                println!("{}", serde_json::to_string_pretty(&parsed)?);
                Ok(())
            }
            Command::Batch(target) => target.run(),
        }
    }
}

impl ShapeOut {
    fn run(&self) -> anyhow::Result<()> {
        let matcher = RegexShapeMatcher::new(self.config_settings.load()?);
        let patterns = Type::union(self.pattern.iter().map(|p| Type::constant_string(p.as_str())));
        let scope = MapScope::new().with_var("pattern", patterns);
        let flags = match self.flags.as_deref() {
            None => None,
            Some(src) => match Expr::parse_flags(src) {
                Some(expr) => Some(expr),
                None => bail!("cannot read flags expression {src:?}"),
            },
        };
        let pattern = Expr::var("pattern");
        let ty = match self.mode {
            MatchMode::One => matcher.match_expr(&pattern, flags.as_ref(), self.matched, &scope)?,
            MatchMode::All => matcher.match_all_expr(&pattern, flags.as_ref(), self.matched, &scope)?,
        };
        if self.json {
            let out = serde_json::json!({ "type": ty.map(|ty| ty.to_string()) });
            println!("{}", serde_json::to_string_pretty(&out)?);
            return Ok(());
        }
        match ty {
            Some(ty) => println!("{}", ty.to_string().green()),
            None => println!("{}", "unknown".yellow()),
        }
        Ok(())
    }
}

impl BatchOut {
    fn run(&self) -> anyhow::Result<()> {
        let matcher = RegexShapeMatcher::new(self.config_settings.load()?);
        let mut outcomes = Vec::<Outcome>::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let cases = batch::load_cases(&source_path, self.ndjson)?;
            outcomes.extend(batch::run_cases(&matcher, &cases));
        }
        report(&outcomes);
        let out_src = serde_json::to_string_pretty(&outcomes)?;
        match self.out.as_ref() {
            Some(out) => write_output(out, &out_src)?,
            None => println!("{out_src}"),
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report(outcomes: &[Outcome]) {
    let known = outcomes.iter().filter(|o| o.ty.is_some()).count();
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    for outcome in outcomes.iter().filter(|o| o.error.is_some()) {
        let error = outcome.error.as_deref().unwrap_or_default();
        eprintln!("{} {}: {error}", "error".red().bold(), outcome.name);
    }
    eprintln!(
        "{} cases: {} typed, {} unknown, {} failed",
        outcomes.len(),
        known.to_string().green(),
        (outcomes.len() - known - failed).to_string().yellow(),
        failed.to_string().red(),
    );
}

fn write_output(out: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, contents).with_context(|| format!("cannot write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern)? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CommandLineInterface::command().debug_assert();
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let cli = CommandLineInterface::parse_from([
            "preg-shape", "shape", "/(a)/", "--php-version", "7.3", "--group-types", "plain",
        ]);
        let Command::Shape(shape) = cli.cmd else { panic!("expected shape") };
        let config = shape.config_settings.load().unwrap();
        assert_eq!(config.php_version, PhpVersion::new(70300));
        assert_eq!(config.group_types, GroupTyping::Plain);
        assert_eq!(shape.matched, Trinary::Yes);
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["cases.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("cases.json")]);
        assert!(resolve_file_path_patterns(["/nonexistent-dir-*/x.json"]).is_err());
    }
}
