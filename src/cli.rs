//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Resolve a store package id to an installer download from a mirror site.
///
/// Fetches the canonical listing for the identifier, searches the mirror
/// through an external renderer, matches candidates against canonical
/// metadata, and downloads every validated installer.
#[derive(Parser, Debug)]
#[command(name = "apkfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Application identifier in the canonical store (e.g. com.example.app)
    pub identifier: String,

    /// Directory installers are written under
    #[arg(short, long, default_value = "downloads")]
    pub output_dir: PathBuf,

    /// Maximum concurrent per-candidate resolutions (1-16)
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub concurrency: u8,

    /// Maximum retry attempts for transient network failures (0-10)
    #[arg(short = 'r', long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,

    /// External renderer command, invoked as `<command> <url> <output-file>`
    #[arg(long, default_value = "render-page")]
    pub renderer: String,

    /// Canonical store base URL
    #[arg(long, default_value = apkfetch_core::urls::CANONICAL_BASE_URL, hide = true)]
    pub canonical_base_url: String,

    /// Mirror site base URL
    #[arg(long, default_value = apkfetch_core::urls::MIRROR_BASE_URL, hide = true)]
    pub mirror_base_url: String,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_identifier_parses() {
        let args = Args::try_parse_from(["apkfetch", "com.example.app"]).unwrap();
        assert_eq!(args.identifier, "com.example.app");
        assert_eq!(args.concurrency, 4);
        assert_eq!(args.max_retries, 0);
        assert!(!args.json);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_missing_identifier_is_error() {
        let result = Args::try_parse_from(["apkfetch"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["apkfetch", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["apkfetch", "com.example.app", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_concurrency_bounds() {
        let args = Args::try_parse_from(["apkfetch", "com.x", "-c", "16"]).unwrap();
        assert_eq!(args.concurrency, 16);

        let result = Args::try_parse_from(["apkfetch", "com.x", "-c", "0"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );

        let result = Args::try_parse_from(["apkfetch", "com.x", "-c", "17"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_max_retries_bounds() {
        let args = Args::try_parse_from(["apkfetch", "com.x", "-r", "10"]).unwrap();
        assert_eq!(args.max_retries, 10);

        let result = Args::try_parse_from(["apkfetch", "com.x", "-r", "11"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_renderer_and_output_dir_flags() {
        let args = Args::try_parse_from([
            "apkfetch",
            "com.x",
            "--renderer",
            "headless-snap",
            "-o",
            "/tmp/out",
        ])
        .unwrap();
        assert_eq!(args.renderer, "headless-snap");
        assert_eq!(args.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["apkfetch", "com.x", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_json_flag() {
        let args = Args::try_parse_from(["apkfetch", "com.x", "--json"]).unwrap();
        assert!(args.json);
    }
}
