//! Checks every `fixtures/*.json` file against the analyzer.
//!
//! ```text
//! cargo run -p dev-test-runner [NAME-REGEX]
//! ```
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use regex::Regex;
use serde::Deserialize;
use preg_shape::batch::{self, Case};
use preg_shape::path_de::from_str_with_path;
use preg_shape::{Config, RegexShapeMatcher};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    #[serde(default)]
    config: Config,
    cases: Vec<Fixture>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(flatten)]
    case: Case,
    /// `null` when the result must be unknown.
    expected: Option<String>,
}

fn fixture_paths() -> Result<Vec<PathBuf>, String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures");
    let pattern = format!("{}/*.json", root.display());
    let mut paths = glob::glob(&pattern)
        .map_err(|error| error.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.to_string())?;
    paths.sort();
    Ok(paths)
}

fn load(path: &Path) -> Result<FixtureFile, String> {
    let source = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    from_str_with_path(&source)
}

fn main() -> ExitCode {
    let filter = match std::env::args().nth(1).map(|src| Regex::new(&src)).transpose() {
        Ok(filter) => filter,
        Err(error) => {
            eprintln!("❌ invalid filter: {error}");
            return ExitCode::FAILURE;
        }
    };
    let paths = match fixture_paths() {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("❌ cannot list fixtures: {error}");
            return ExitCode::FAILURE;
        }
    };

    let (mut passed, mut failed) = (0usize, 0usize);
    for path in paths {
        let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let fixture_file = match load(&path) {
            Ok(x) => x,
            Err(error) => {
                eprintln!("❌ {file_name}: {error}");
                failed += 1;
                continue;
            }
        };
        let matcher = RegexShapeMatcher::new(fixture_file.config);
        for fixture in fixture_file.cases {
            if filter.as_ref().is_some_and(|re| !re.is_match(&fixture.case.name)) {
                continue;
            }
            let outcome = batch::run_case(&matcher, &fixture.case);
            if let Some(error) = outcome.error {
                eprintln!("❌ {file_name} :: {}: {error}", outcome.name);
                failed += 1;
            } else if outcome.ty == fixture.expected {
                eprintln!("✅ {file_name} :: {}", outcome.name);
                passed += 1;
            } else {
                eprintln!("❌ {file_name} :: {}", outcome.name);
                eprintln!("   expected: {}", fixture.expected.as_deref().unwrap_or("unknown"));
                eprintln!("   actual:   {}", outcome.ty.as_deref().unwrap_or("unknown"));
                failed += 1;
            }
        }
    }

    eprintln!("—— {passed} passed, {failed} failed ——");
    if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
