use std::path::PathBuf;

/// Parsed command line. The only positional argument is the plan path.
#[derive(Debug, PartialEq)]
pub struct CliArgs {
    pub plan_path: PathBuf,
    pub artifacts_dir: Option<PathBuf>,
    pub journal_path: Option<PathBuf>,
    pub balance: Option<u128>,
    pub validate_only: bool,
    pub json: bool,
    pub debug: bool,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            plan_path: PathBuf::from("migrations.yaml"),
            artifacts_dir: None,
            journal_path: None,
            balance: None,
            validate_only: false,
            json: false,
            debug: false,
            help: false,
        }
    }
}

impl CliArgs {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut plan_given = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--artifacts" => {
                    parsed.artifacts_dir = Some(PathBuf::from(take_value(&mut iter, arg)?));
                }
                "--journal" => {
                    parsed.journal_path = Some(PathBuf::from(take_value(&mut iter, arg)?));
                }
                "--balance" => {
                    let value = take_value(&mut iter, arg)?;
                    parsed.balance = Some(
                        value
                            .parse()
                            .map_err(|_| format!("--balance expects an integer, got '{value}'"))?,
                    );
                }
                "--validate" => parsed.validate_only = true,
                "--json" => parsed.json = true,
                "--debug" => parsed.debug = true,
                "--help" | "-h" => parsed.help = true,
                other if other.starts_with('-') => {
                    return Err(format!("unknown flag '{other}'"));
                }
                other => {
                    if plan_given {
                        return Err(format!("unexpected argument '{other}'"));
                    }
                    parsed.plan_path = PathBuf::from(other);
                    plan_given = true;
                }
            }
        }

        Ok(parsed)
    }
}

fn take_value<'a>(
    iter: &mut std::slice::Iter<'a, String>,
    flag: &str,
) -> Result<&'a String, String> {
    iter.next().ok_or_else(|| format!("{flag} expects a value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_with_no_arguments() {
        let parsed = CliArgs::parse(&[]).unwrap();
        assert_eq!(parsed, CliArgs::default());
        assert_eq!(parsed.plan_path, PathBuf::from("migrations.yaml"));
    }

    #[test]
    fn full_argument_set() {
        let parsed = CliArgs::parse(&args(&[
            "demos/migrations.yaml",
            "--artifacts",
            "demos/build",
            "--journal",
            "out.json",
            "--balance",
            "500000",
            "--validate",
            "--json",
            "--debug",
        ]))
        .unwrap();

        assert_eq!(parsed.plan_path, PathBuf::from("demos/migrations.yaml"));
        assert_eq!(parsed.artifacts_dir, Some(PathBuf::from("demos/build")));
        assert_eq!(parsed.journal_path, Some(PathBuf::from("out.json")));
        assert_eq!(parsed.balance, Some(500_000));
        assert!(parsed.validate_only);
        assert!(parsed.json);
        assert!(parsed.debug);
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let err = CliArgs::parse(&args(&["--frobnicate"])).unwrap_err();
        assert!(err.contains("unknown flag"));
    }

    #[test]
    fn flag_missing_value_is_an_error() {
        let err = CliArgs::parse(&args(&["--balance"])).unwrap_err();
        assert!(err.contains("expects a value"));
    }

    #[test]
    fn non_numeric_balance_is_an_error() {
        let err = CliArgs::parse(&args(&["--balance", "lots"])).unwrap_err();
        assert!(err.contains("expects an integer"));
    }

    #[test]
    fn second_positional_is_an_error() {
        let err = CliArgs::parse(&args(&["a.yaml", "b.yaml"])).unwrap_err();
        assert!(err.contains("unexpected argument"));
    }
}
