// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! vbsharp command-line interface.
//!
//! This is the main entry point for the `vbsharp` command.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;

/// vbsharp: translate VBScript into C#
#[derive(Debug, Parser)]
#[command(name = "vbsharp")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Translate a VBScript file to C#
    Translate {
        /// VBScript source file
        path: Utf8PathBuf,

        /// Write the C# here instead of standard output
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,

        #[command(flatten)]
        shape: commands::OutputShape,
    },

    /// Check that a VBScript file translates, reporting warnings
    Check {
        /// VBScript source file
        path: Utf8PathBuf,

        #[command(flatten)]
        shape: commands::OutputShape,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Translate {
            path,
            output,
            shape,
        } => commands::translate(&path, output.as_deref(), &shape),
        Command::Check { path, shape } => commands::check(&path, &shape),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    // Targets are module paths, so the binary is `vbsharp_cli`. Translation
    // warnings are printed by the commands, so the core stays quiet by default.
    match v {
        0 => "vbsharp_cli=info,vbsharp_core=error",
        1 => "vbsharp_cli=debug,vbsharp_core=debug",
        _ => "vbsharp_cli=trace,vbsharp_core=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_defaults() {
        assert_eq!(directive_for_verbosity(0), "vbsharp_cli=info,vbsharp_core=error");
        assert_eq!(directive_for_verbosity(1), "vbsharp_cli=debug,vbsharp_core=debug");
        assert_eq!(directive_for_verbosity(7), "vbsharp_cli=trace,vbsharp_core=trace");
    }

    #[test]
    fn parses_translate_options() {
        let cli = Cli::parse_from([
            "vbsharp",
            "translate",
            "script.vbs",
            "-o",
            "Script.cs",
            "--namespace",
            "Acme",
            "--external-dependency",
            "WScript",
            "--external-dependency",
            "Response",
        ]);
        let Command::Translate {
            path,
            output,
            shape,
        } = cli.command
        else {
            panic!("expected translate");
        };
        assert_eq!(path, "script.vbs");
        assert_eq!(output.as_deref().map(camino::Utf8Path::as_str), Some("Script.cs"));
        assert_eq!(shape.namespace, "Acme");
        assert_eq!(shape.external_dependency, vec!["WScript", "Response"]);
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::parse_from(["vbsharp", "check", "a.vbs", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
