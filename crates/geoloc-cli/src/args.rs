use clap::Parser;
use geoloc_core::StoreBackend;
use std::path::PathBuf;

/// CLI arguments for geoloc
#[derive(Debug, Parser)]
#[command(
    name = "geoloc",
    version,
    about = "Import Brazilian municipalities from GeoNames and serve them over HTTP",
    after_help = "Actions can be combined and run in the order: --import-all, --import, --serve.\n\
                  Example: geoloc --import --file BR.txt --serve"
)]
pub struct CliArgs {
    /// Import data. Without --file, loads the fixed list of demo cities
    #[arg(long)]
    pub import: bool,

    /// GeoNames TSV file to import (implies --import; *.gz is accepted)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Simple import mode: no country/bounds filtering, region column kept verbatim
    #[arg(long, requires = "file")]
    pub simple: bool,

    /// Reset the collection, download the GeoNames BR dump and import it
    #[arg(long = "import-all", alias = "importall")]
    pub import_all: bool,

    /// Start the HTTP server
    #[arg(long)]
    pub serve: bool,

    /// HTTP port
    #[arg(long, env = "GEOLOC_PORT")]
    pub port: Option<u16>,

    /// Store backend
    #[arg(long = "store", value_name = "BACKEND", env = "GEOLOC_STORE")]
    pub backend: Option<StoreBackend>,

    /// MongoDB connection string
    #[arg(long, env = "GEOLOC_MONGO_URI")]
    pub mongo_uri: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "GEOLOC_DATABASE")]
    pub database: Option<String>,

    /// MongoDB collection name
    #[arg(long, env = "GEOLOC_COLLECTION")]
    pub collection: Option<String>,

    /// Snapshot file for the memory backend (bincode, gzip if it ends in .gz)
    #[arg(long, value_name = "PATH", env = "GEOLOC_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// TOML configuration file; flags override its values
    #[arg(short = 'c', long = "config", value_name = "PATH", env = "GEOLOC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    /// Whether anything should be imported from a file or the demo list.
    pub fn wants_import(&self) -> bool {
        self.import || self.file.is_some()
    }

    pub fn has_action(&self) -> bool {
        self.wants_import() || self.import_all || self.serve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("geoloc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_flags_means_no_action() {
        let args = parse(&[]);
        assert!(!args.has_action());
        assert!(args.port.is_none());
    }

    #[test]
    fn file_implies_import() {
        let args = parse(&["--file", "BR.txt", "--simple"]);
        assert!(args.wants_import());
        assert!(args.simple);
        assert_eq!(args.file.as_deref(), Some(std::path::Path::new("BR.txt")));
    }

    #[test]
    fn simple_requires_file() {
        assert!(CliArgs::try_parse_from(["geoloc", "--import", "--simple"]).is_err());
    }

    #[test]
    fn importall_alias_is_accepted() {
        assert!(parse(&["--importall"]).import_all);
        assert!(parse(&["--import-all"]).import_all);
    }

    #[test]
    fn combined_actions_and_store_flags() {
        let args = parse(&["--import", "--serve", "--port", "9090", "--store", "memory"]);
        assert!(args.import && args.serve);
        assert_eq!(args.port, Some(9090));
        assert_eq!(args.backend, Some(StoreBackend::Memory));
        assert!(CliArgs::try_parse_from(["geoloc", "--store", "redis"]).is_err());
    }
}
