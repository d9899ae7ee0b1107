//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use panxfer_engine::{DownloadSource, FailurePolicy, TransferConfig};

#[derive(Parser, Debug)]
#[command(
    name = "panxfer",
    version,
    about = "Parallel downloads from and deduplicating uploads to cloud storage"
)]
pub struct Cli {
    /// Configuration file (default: ~/.config/panxfer/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a stored file.
    Download(DownloadArgs),
    /// Upload a local file.
    Upload(UploadArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["link", "fs_id", "path"])))]
pub struct DownloadArgs {
    /// Download link; the access token is appended to it.
    #[arg(long)]
    pub link: Option<String>,

    /// Stored file id.
    #[arg(long)]
    pub fs_id: Option<u64>,

    /// Stored file path.
    #[arg(long)]
    pub path: Option<String>,

    /// Local destination file.
    #[arg(short, long)]
    pub out: PathBuf,

    /// Target part size in bytes.
    #[arg(long)]
    pub part_size: Option<u64>,

    #[command(flatten)]
    pub tuning: Tuning,
}

impl DownloadArgs {
    pub fn source(&self) -> Option<DownloadSource> {
        if let Some(link) = &self.link {
            Some(DownloadSource::Link(link.clone()))
        } else if let Some(fs_id) = self.fs_id {
            Some(DownloadSource::FsId(fs_id))
        } else {
            self.path.clone().map(DownloadSource::Path)
        }
    }

    pub fn apply(&self, mut config: TransferConfig) -> TransferConfig {
        if let Some(part_size) = self.part_size {
            config.part_size = part_size;
        }
        self.tuning.apply(config)
    }
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file to upload.
    #[arg(short, long)]
    pub file: PathBuf,

    /// Remote destination path, e.g. /apps/myapp/file.bin.
    #[arg(short, long)]
    pub to: String,

    #[command(flatten)]
    pub tuning: Tuning,
}

/// Worker pool overrides shared by both subcommands.
#[derive(Args, Debug, Default)]
pub struct Tuning {
    /// Concurrent requests.
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Let every worker finish after a failure instead of cancelling.
    #[arg(long)]
    pub drain_all: bool,
}

impl Tuning {
    pub fn apply(&self, mut config: TransferConfig) -> TransferConfig {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.drain_all {
            config.failure_policy = FailurePolicy::DrainAll;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn download_by_link() {
        let cli = Cli::try_parse_from([
            "panxfer",
            "download",
            "--link",
            "https://d.pcs.baidu.com/file/x",
            "--out",
            "x.bin",
            "-j",
            "4",
            "--drain-all",
        ])
        .unwrap();

        let Command::Download(args) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(
            args.source(),
            Some(DownloadSource::Link("https://d.pcs.baidu.com/file/x".into()))
        );
        let config = args.apply(TransferConfig::default());
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.failure_policy, FailurePolicy::DrainAll);
    }

    #[test]
    fn download_by_fs_id_with_part_size() {
        let cli = Cli::try_parse_from([
            "panxfer",
            "download",
            "--fs-id",
            "714504460793248",
            "--out",
            "deck.pptx",
            "--part-size",
            "1048576",
        ])
        .unwrap();

        let Command::Download(args) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(args.source(), Some(DownloadSource::FsId(714504460793248)));
        assert_eq!(args.apply(TransferConfig::default()).part_size, 1_048_576);
    }

    #[test]
    fn download_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["panxfer", "download", "--out", "x"]).is_err());
        assert!(
            Cli::try_parse_from([
                "panxfer", "download", "--link", "a", "--path", "/b", "--out", "x"
            ])
            .is_err()
        );
    }

    #[test]
    fn upload_args() {
        let cli = Cli::try_parse_from([
            "panxfer",
            "--config",
            "/tmp/panxfer.toml",
            "upload",
            "--file",
            "local.bin",
            "--to",
            "/apps/demo/local.bin",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/panxfer.toml")));
        let Command::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.to, "/apps/demo/local.bin");
        let config = args.tuning.apply(TransferConfig::default());
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
    }
}
