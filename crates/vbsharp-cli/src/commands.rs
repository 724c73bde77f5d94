// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The `translate` and `check` commands.

use camino::Utf8Path;
use clap::Args;
use miette::{Context, IntoDiagnostic, NamedSource, Result};
use tracing::{debug, info, instrument};
use vbsharp_core::prelude::*;

/// Options that shape the generated C#.
#[derive(Debug, Args)]
pub struct OutputShape {
    /// Namespace wrapping the generated classes
    #[arg(long, default_value = "TranslatedProgram")]
    pub namespace: String,

    /// Name of the class whose `Go` method runs the script
    #[arg(long, default_value = "Runner")]
    pub runner_class: String,

    /// A name the host provides (`WScript`, `Response`, ...); may repeat
    #[arg(long)]
    pub external_dependency: Vec<String>,
}

impl OutputShape {
    fn options(&self) -> TranslatorOptions {
        self.external_dependency.iter().fold(
            TranslatorOptions::new()
                .with_namespace(&self.namespace)
                .with_runner_class_name(&self.runner_class),
            |options, name| options.with_external_dependency(name),
        )
    }
}

/// Translate `path` and write the C# to `output`, or standard output.
#[instrument(skip_all, fields(path = %path))]
pub fn translate(path: &Utf8Path, output: Option<&Utf8Path>, shape: &OutputShape) -> Result<()> {
    let program = translate_file(path, shape)?;
    let rendered = program.render();
    match output {
        Some(output) => {
            std::fs::write(output, rendered)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write '{output}'"))?;
            info!("Wrote {}", output);
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Translate `path`, discarding the output.
#[instrument(skip_all, fields(path = %path))]
pub fn check(path: &Utf8Path, shape: &OutputShape) -> Result<()> {
    let program = translate_file(path, shape)?;
    println!(
        "{path}: ok ({} warning{})",
        program.warnings.len(),
        if program.warnings.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

fn translate_file(path: &Utf8Path, shape: &OutputShape) -> Result<TranslatedProgram> {
    let source = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read '{path}'"))?;
    debug!("Read {} bytes", source.len());

    let program = vbsharp_core::translate(&source, &shape.options()).map_err(|error| {
        miette::Report::new(error).with_source_code(NamedSource::new(path.as_str(), source.clone()))
    })?;
    for warning in &program.warnings {
        eprintln!("warning: {path}: {warning}");
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> OutputShape {
        OutputShape {
            namespace: "Acme".to_string(),
            runner_class: "Script".to_string(),
            external_dependency: vec!["WScript".to_string()],
        }
    }

    #[test]
    fn options_carry_shape() {
        let options = shape().options();
        assert_eq!(options.namespace(), "Acme");
        assert_eq!(options.runner_class_name(), "Script");
        assert_eq!(options.external_dependencies().len(), 1);
        assert_eq!(options.external_dependencies()[0].as_str(), "WScript");
    }

    #[test]
    fn missing_file_is_reported() {
        let error = check(Utf8Path::new("does/not/exist.vbs"), &shape()).unwrap_err();
        assert_eq!(error.to_string(), "Failed to read 'does/not/exist.vbs'");
    }
}
