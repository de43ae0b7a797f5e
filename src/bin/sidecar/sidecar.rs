use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;

use sidecar_dump::{
    DumpTarget, RelocationReport, SearchStats, SidecarError, SidecarIndex, derive_folder_name, format_size,
    get_relative_path_or_full, path_to_filename_string, print_bold, print_warning, relocate_with,
};

use crate::Args;
use crate::config::Config;
use crate::logger::FileLogger;

/// Search for sidecar files and optionally dump them to a separate directory.
#[derive(Debug)]
pub struct Sidecar {
    root: PathBuf,
    config: Config,
}

impl Sidecar {
    pub fn new(args: Args) -> anyhow::Result<Self> {
        let root = sidecar_dump::resolve_directory(args.path.as_deref())?;
        let config = Config::from_args(args)?;
        if config.debug {
            eprintln!("Config: {config:#?}");
            eprintln!("Root: {}", root.display());
        }
        Ok(Self { root, config })
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let options = self.config.search_options();
        options.validate(&self.root)?;

        if self.config.verbose {
            println!("Searching: {}", self.root.display().to_string().magenta());
            println!(
                "Raw suffix: {}, sidecar suffix: {}, time check: {}",
                options.raw_suffix,
                options.sidecar_suffix,
                sidecar_dump::colorize_bool(options.check_time_coherence)
            );
        }

        let (mut index, stats) = SidecarIndex::build(&self.root, &options);
        self.print_index(&index);
        Self::print_stats(&stats);

        if index.is_empty() {
            println!("{}", "No sidecar files found".yellow());
            return Ok(());
        }

        let Some(destination) = self.config.destination.as_deref() else {
            if self.config.verbose {
                println!("No destination given, nothing to move.");
            }
            return Ok(());
        };

        let target = self.dump_target(destination);
        target.validate()?;
        let dump_root = target.dump_root();

        if self.config.dryrun {
            self.print_planned_moves(&index, &dump_root)?;
            return Ok(());
        }

        println!("\n  {} Move to: {}", "→".green(), dump_root.display());
        if !self.confirm(&format!("Move {} sidecar file(s)? (y/n): ", index.len()))? {
            println!("  Skipped");
            return Ok(());
        }

        let mut logger = if self.config.log {
            let mut logger = FileLogger::new()?;
            logger.log_init(&self.root, &dump_root, &self.config, &stats);
            Some(logger)
        } else {
            None
        };

        let result = relocate_with(&mut index, &target, |info| {
            if self.config.verbose {
                println!("  {}", get_relative_path_or_full(&info.target, &dump_root));
            }
            if let Some(logger) = logger.as_mut() {
                logger.log_move(info);
            }
        });

        match result {
            Ok(report) => {
                if let Some(logger) = logger.as_mut() {
                    logger.log_summary(&report);
                }
                Self::print_report(&report, &index);
                if let Some(logger) = &logger {
                    println!("Log file: {}", logger.path().display());
                }
                Ok(())
            }
            Err(error) => {
                if let Some(logger) = logger.as_mut() {
                    logger.log_error(&error);
                }
                self.report_failure(&error, &index);
                Err(error).context("Relocation stopped before all files were moved")
            }
        }
    }

    /// Resolve the dump folder name, falling back to the derived name of the search root.
    fn dump_target(&self, destination: &Path) -> DumpTarget {
        let folder_name = self
            .config
            .folder_name
            .clone()
            .unwrap_or_else(|| derive_folder_name(&self.root));
        let destination = dunce::canonicalize(destination).unwrap_or_else(|_| destination.to_path_buf());
        DumpTarget::new(destination, folder_name)
    }

    fn print_index(&self, index: &SidecarIndex) {
        for (directory, files) in index {
            let dir_display = get_relative_path_or_full(directory, &self.root);
            println!("{}: {} file(s)", dir_display.cyan().bold(), files.len());
            if self.config.verbose {
                for file in files {
                    println!("  {}", path_to_filename_string(file));
                }
            }
        }
    }

    fn print_stats(stats: &SearchStats) {
        print_bold!(
            "\nRaw files: {}, sidecar files: {}, total size: {}",
            stats.raw_files,
            stats.sidecar_files,
            format_size(stats.total_size)
        );
    }

    fn print_planned_moves(&self, index: &SidecarIndex, dump_root: &Path) -> anyhow::Result<()> {
        let moves = index.planned_moves(dump_root)?;
        print_bold!("\nWould move {} file(s) to {}:", moves.len(), dump_root.display());
        for info in &moves {
            println!(
                "  {} {} {}",
                get_relative_path_or_full(&info.source, &self.root),
                "→".green(),
                get_relative_path_or_full(&info.target, dump_root)
            );
        }
        Ok(())
    }

    fn print_report(report: &RelocationReport, index: &SidecarIndex) {
        print_bold!(
            "\nMoved {} file(s) from {} directories to {}",
            report.moved_files,
            report.directories,
            report.dump_root.display()
        );
        println!(
            "Remaining sidecar files: {}, total size: {}",
            index.len(),
            format_size(index.total_size())
        );
    }

    /// Print what was left in place after a failed relocation.
    /// The error itself is reported by the caller.
    fn report_failure(&self, error: &SidecarError, index: &SidecarIndex) {
        for line in self.failure_details(error, index) {
            print_warning!("{line}");
        }
    }

    fn failure_details(&self, error: &SidecarError, index: &SidecarIndex) -> Vec<String> {
        let SidecarError::Move { moved, .. } = error else {
            return Vec::new();
        };
        let mut lines = vec![format!(
            "{moved} file(s) were already moved, {} file(s) in {} directories were left in place",
            index.len(),
            index.directory_count()
        )];
        lines.extend(
            index
                .files()
                .map(|file| format!("  {}", get_relative_path_or_full(file, &self.root))),
        );
        lines
    }

    /// Ask the user for confirmation, unless running with auto confirm.
    fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
        if self.config.auto {
            return Ok(true);
        }
        print!("{}", prompt.magenta());
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    }
}
