use std::path::PathBuf;

use clap::Parser;

use crate::output::Format;

/// Jexrun - run a Jex transformation script against a JSON document
#[derive(Parser, Debug)]
#[command(name = "jexrun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the script file
    pub script: PathBuf,

    /// Input JSON path (defaults to <script-base>.input.json when present)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the rendered result to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Metadata JSON path (no implicit default)
    #[arg(short, long)]
    pub meta: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "Json", ignore_case = true)]
    pub format: Format,

    /// Re-run whenever the script or its companion files change
    #[arg(short, long)]
    pub watch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_script_only() {
        let cli = Cli::try_parse_from(["jexrun", "t.jex"]).unwrap();
        assert_eq!(cli.script, PathBuf::from("t.jex"));
        assert_eq!(cli.format, Format::Json);
        assert!(cli.input.is_none());
        assert!(cli.output.is_none());
        assert!(cli.meta.is_none());
        assert!(!cli.watch);
    }

    #[test]
    fn test_cli_parse_all_options() {
        let cli = Cli::try_parse_from([
            "jexrun", "t.jex", "-i", "in.json", "-o", "out.json", "-m", "meta.json", "-f",
            "Detailed", "-w",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("in.json")));
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
        assert_eq!(cli.meta, Some(PathBuf::from("meta.json")));
        assert_eq!(cli.format, Format::Detailed);
        assert!(cli.watch);
    }

    #[test]
    fn test_cli_format_is_case_insensitive() {
        let cli = Cli::try_parse_from(["jexrun", "t.jex", "--format", "pretty"]).unwrap();
        assert_eq!(cli.format, Format::Pretty);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["jexrun", "t.jex", "-f", "xml"]).is_err());
    }

    #[test]
    fn test_cli_requires_script() {
        assert!(Cli::try_parse_from(["jexrun"]).is_err());
    }
}
