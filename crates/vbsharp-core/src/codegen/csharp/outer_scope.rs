// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Assembles a complete C# translation unit from a program's top-level
//! blocks.
//!
//! **DDD Context:** Compilation — Code Generation
//!
//! The unit has four parts, all in one namespace:
//!
//! - the runner, whose `Go` method holds the executable top-level statements;
//! - the global references class, holding top-level variables as properties
//!   and top-level functions as methods;
//! - the environment references class, holding external dependencies and
//!   every name the top-level statements use without declaring;
//! - one class per VBScript class.
//!
//! Executable statements are translated first so that the names they touch
//! without declaring are known before the reference classes are emitted.

use ecow::EcoString;
use tracing::{debug, info};

use crate::ast::{ClassBlock, CodeBlock, FunctionBlock, Visibility};
use crate::source_analysis::Token;

use super::declarations::collect_declared_names;
use super::document::render_statements;
use super::functions::contains_on_error_resume_next;
use super::scope::{NameLocation, ScopeAccessInformation, ScopedName};
use super::{
    CodeBlockTranslator, Result, STATEMENT_HANDLERS, TranslatedStatement, TranslationError,
    TranslationResult, TranslationWarning, VariableDeclaration, initial_value,
};

/// Type of the compat layer field held by every generated class.
pub(super) const COMPAT_LAYER_TYPE: &str = "IProvideVBScriptCompatFunctionalityToIndividualRequests";

const USINGS: &[&str] = &[
    "System",
    "System.Collections",
    "System.Runtime.InteropServices",
    "VBScriptTranslator.RuntimeSupport",
    "VBScriptTranslator.RuntimeSupport.Attributes",
    "VBScriptTranslator.RuntimeSupport.Exceptions",
    "VBScriptTranslator.RuntimeSupport.Compat",
];

/// A translated program: the C# lines plus the warnings raised on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedProgram {
    pub statements: Vec<TranslatedStatement>,
    pub warnings: Vec<TranslationWarning>,
}

impl TranslatedProgram {
    /// The C# source text, four spaces per indentation level.
    #[must_use]
    pub fn render(&self) -> String {
        let mut rendered = render_statements(&self.statements);
        rendered.push('\n');
        rendered
    }
}

/// A field of the environment references class.
#[derive(Debug)]
struct EnvironmentField {
    source: EcoString,
    rewritten: EcoString,
    line_index: usize,
    /// Touched by the top-level statements without a declaration, as
    /// opposed to supplied by the host.
    undeclared: bool,
}

/// Top-level blocks grouped by what the translation unit does with them.
#[derive(Debug, Default)]
struct Partition<'p> {
    executable: Vec<&'p CodeBlock>,
    /// Functions with the comments that preceded them.
    functions: Vec<(Vec<&'p CodeBlock>, FunctionBlock)>,
    classes: Vec<(Vec<&'p CodeBlock>, &'p ClassBlock)>,
}

impl CodeBlockTranslator {
    /// Translates a whole program.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationError::PropertyOutsideClass`] for a top-level
    /// property, [`TranslationError::DuplicateClass`] or
    /// [`TranslationError::NameRedefined`] for clashing top-level names, and
    /// propagates errors from every nested translator.
    pub fn translate_program(&self, blocks: &[CodeBlock]) -> Result<TranslatedProgram> {
        let mut warnings = Vec::new();
        let partition = self.partition(blocks, &mut warnings)?;
        let executable: Vec<CodeBlock> = partition.executable.iter().map(|&block| block.clone()).collect();

        let (scope, implicit) = self.outermost_scope(&executable, &partition);

        // Runner.Go body
        let (go_body, error_token) = self.translate_executable(&executable, &scope)?;
        let mut go_body = go_body;
        warnings.append(&mut go_body.warnings);

        let globals = self.global_fields(&go_body.explicit_variable_declarations, &implicit)?;
        let environment = self.environment_fields(&go_body.undeclared_variables_accessed, &scope, &mut warnings);
        debug!(
            "Outermost scope: {} globals, {} environment references, error trapping {}",
            globals.len(),
            environment.len(),
            if error_token.is_some() { "on" } else { "off" }
        );

        // Functions and classes see the environment names the executable
        // statements created.
        let member_scope = scope.extend_variables(environment.iter().map(|field| {
            ScopedName::new(
                field.source.clone(),
                field.rewritten.clone(),
                NameLocation::Environment,
                field.line_index,
            )
        }));

        let mut output = TranslationResult::new();
        for using in USINGS {
            output.push_skeleton(format!("using {using};"), 0);
        }
        output.push_skeleton("", 0);
        output.push_skeleton(format!("namespace {}", self.options().namespace()), 0);
        output.push_skeleton("{", 0);

        self.emit_runner(go_body.translated_statements, &mut output);
        output.push_skeleton("", 1);
        self.emit_global_references(&globals, &partition, &member_scope, &mut output, &mut warnings)?;
        output.push_skeleton("", 1);
        self.emit_environment_references(&environment, &mut output);

        for (comments, class) in &partition.classes {
            output.push_skeleton("", 1);
            for comment in comments {
                if let CodeBlock::Comment(comment) = comment {
                    output.push(TranslatedStatement::new(
                        format!("//{}", comment.token.content()),
                        1,
                        comment.token.line_index(),
                    ));
                }
            }
            let mut translated = self.translate_class(class, &member_scope, 1)?;
            warnings.append(&mut translated.warnings);
            output = output.add(translated);
        }
        output.push_skeleton("}", 0);

        Ok(TranslatedProgram {
            statements: output.translated_statements,
            warnings,
        })
    }

    fn partition<'p>(
        &self,
        blocks: &'p [CodeBlock],
        warnings: &mut Vec<TranslationWarning>,
    ) -> Result<Partition<'p>> {
        let mut partition = Partition::default();
        let mut pending: Vec<&'p CodeBlock> = Vec::new();

        for block in blocks {
            match block {
                CodeBlock::Comment(comment) if !comment.is_inline => pending.push(block),
                CodeBlock::BlankLine(_) => pending.push(block),
                CodeBlock::Function(function) => {
                    if function.kind.is_property() {
                        return Err(TranslationError::PropertyOutsideClass {
                            name: function.name.content().clone(),
                            line: function.keyword.line_index() + 1,
                        });
                    }
                    let comments = std::mem::take(&mut pending);
                    let mut function = function.clone();
                    if function.visibility != Visibility::Public {
                        info!(
                            "Making private function {} public at outermost scope",
                            function.name.content()
                        );
                        let warning = TranslationWarning::FunctionMadePublic {
                            name: function.name.content().clone(),
                            line: function.keyword.line_index() + 1,
                        };
                        warning.log();
                        warnings.push(warning);
                        function.visibility = Visibility::Public;
                    }
                    let rewritten = self.rewrite_token(&function.name);
                    if let Some(position) = partition
                        .functions
                        .iter()
                        .position(|(_, f)| self.rewrite_token(&f.name).eq_ignore_ascii_case(&rewritten))
                    {
                        let (_, replaced) = partition.functions.remove(position);
                        let warning = TranslationWarning::DuplicateFunctionReplaced {
                            name: replaced.name.content().clone(),
                            line: replaced.keyword.line_index() + 1,
                        };
                        warning.log();
                        warnings.push(warning);
                    }
                    partition.functions.push((comments, function));
                }
                CodeBlock::Class(class) => {
                    let rewritten = self.rewrite_token(&class.name);
                    if partition
                        .classes
                        .iter()
                        .any(|(_, c)| self.rewrite_token(&c.name).eq_ignore_ascii_case(&rewritten))
                    {
                        return Err(TranslationError::DuplicateClass {
                            name: class.name.content().clone(),
                            line: class.keyword.line_index() + 1,
                        });
                    }
                    partition.classes.push((std::mem::take(&mut pending), class));
                }
                other => {
                    partition.executable.append(&mut pending);
                    partition.executable.push(other);
                }
            }
        }
        partition.executable.append(&mut pending);

        for (_, class) in &partition.classes {
            let rewritten = self.rewrite_token(&class.name);
            if partition
                .functions
                .iter()
                .any(|(_, f)| self.rewrite_token(&f.name).eq_ignore_ascii_case(&rewritten))
            {
                return Err(TranslationError::NameRedefined {
                    name: class.name.content().clone(),
                    line: class.keyword.line_index() + 1,
                });
            }
        }
        Ok(partition)
    }

    /// External dependencies, top-level functions and classes, and every
    /// top-level declaration, visible before any statement is translated.
    /// Also returns the `ReDim` targets nothing else declares.
    fn outermost_scope(
        &self,
        executable: &[CodeBlock],
        partition: &Partition<'_>,
    ) -> (ScopeAccessInformation, Vec<Token>) {
        let externals = self.options().external_dependencies().iter().map(|name| {
            ScopedName::new(name.clone(), self.rewrite(name), NameLocation::Environment, 0)
        });
        let functions = partition.functions.iter().map(|(_, function)| {
            ScopedName::new(
                function.name.content().clone(),
                self.rewrite_token(&function.name),
                NameLocation::OutermostScope,
                function.name.line_index(),
            )
        });
        let classes = partition.classes.iter().map(|(_, class)| {
            ScopedName::new(
                class.name.content().clone(),
                self.rewrite_token(&class.name),
                NameLocation::OutermostScope,
                class.name.line_index(),
            )
        });
        let scope = ScopeAccessInformation::outermost(externals)
            .extend_functions(functions)
            .extend_classes(classes);

        let declared = collect_declared_names(executable);
        let implicit = self.implicit_declarations(&declared, &scope);
        let variables = declared
            .explicit
            .iter()
            .chain(&implicit)
            .map(|token| {
                ScopedName::new(
                    token.content().clone(),
                    self.rewrite_token(token),
                    NameLocation::OutermostScope,
                    token.line_index(),
                )
            })
            .collect::<Vec<_>>();
        (scope.extend_variables(variables), implicit)
    }

    /// The body of `Go(env)`, wrapped in error trapping setup when the
    /// top-level statements contain `On Error Resume Next`.
    fn translate_executable(
        &self,
        executable: &[CodeBlock],
        scope: &ScopeAccessInformation,
    ) -> Result<(TranslationResult, Option<EcoString>)> {
        let body_depth = 3;
        if !contains_on_error_resume_next(executable) {
            let body = self.translate_common(STATEMENT_HANDLERS, executable, scope, body_depth)?;
            return Ok((body, None));
        }

        let (token, scope) = scope.reserve_temp("errOn");
        let scope = scope.with_error_registration_token(Some(token.clone()));
        let mut result = TranslationResult::new();
        result.push_skeleton(format!("var {token} = _.GETERRORTRAPPINGTOKEN();"), body_depth);
        result.push_skeleton("try", body_depth);
        result.push_skeleton("{", body_depth);
        let body = self.translate_common(STATEMENT_HANDLERS, executable, &scope, body_depth + 1)?;
        let mut result = result.add(body);
        result.push_skeleton("}", body_depth);
        result.push_skeleton("finally", body_depth);
        result.push_skeleton("{", body_depth);
        result.push_skeleton(format!("_.RELEASEERRORTRAPPINGTOKEN({token});"), body_depth + 1);
        result.push_skeleton("}", body_depth);
        Ok((result, Some(token)))
    }

    /// Fields of the global references class: `(rewritten name,
    /// constant dimensions, source line)`. Repeated declarations are errors.
    fn global_fields(
        &self,
        declarations: &[VariableDeclaration],
        implicit: &[Token],
    ) -> Result<Vec<(EcoString, Option<Vec<usize>>, usize)>> {
        let mut fields: Vec<(EcoString, Option<Vec<usize>>, usize)> = Vec::new();
        for declaration in declarations {
            let rewritten = self.rewrite_token(&declaration.name);
            if fields.iter().any(|(name, _, _)| name.eq_ignore_ascii_case(&rewritten)) {
                return Err(TranslationError::NameRedefined {
                    name: declaration.name.content().clone(),
                    line: declaration.name.line_index() + 1,
                });
            }
            fields.push((
                rewritten,
                declaration.constant_dimensions.clone(),
                declaration.name.line_index(),
            ));
        }
        for token in implicit {
            fields.push((self.rewrite_token(token), None, token.line_index()));
        }
        Ok(fields)
    }

    /// External dependencies followed by the distinct undeclared names.
    fn environment_fields(
        &self,
        undeclared: &[Token],
        scope: &ScopeAccessInformation,
        warnings: &mut Vec<TranslationWarning>,
    ) -> Vec<EnvironmentField> {
        let mut fields: Vec<EnvironmentField> = self
            .options()
            .external_dependencies()
            .iter()
            .map(|name| EnvironmentField {
                source: name.clone(),
                rewritten: self.rewrite(name),
                line_index: 0,
                undeclared: false,
            })
            .collect();
        for token in undeclared {
            let rewritten = self.rewrite_token(token);
            if fields.iter().any(|field| field.rewritten.eq_ignore_ascii_case(&rewritten))
                || scope.find_variable(&rewritten).is_some()
            {
                continue;
            }
            let warning = TranslationWarning::UndeclaredVariable {
                name: token.content().clone(),
                line: token.line_index() + 1,
            };
            warning.log();
            warnings.push(warning);
            fields.push(EnvironmentField {
                source: token.content().clone(),
                rewritten,
                line_index: token.line_index(),
                undeclared: true,
            });
        }
        fields
    }

    fn emit_runner(
        &self,
        body: Vec<TranslatedStatement>,
        output: &mut TranslationResult,
    ) {
        let runner = self.options().runner_class_name();
        let outer = self.options().outer_class_name();
        let environment = self.options().environment_class_name();

        output.push_skeleton(format!("public class {runner}"), 1);
        output.push_skeleton("{", 1);
        output.push_skeleton(format!("private readonly {COMPAT_LAYER_TYPE} _;"), 2);
        output.push_skeleton(format!("public {runner}({COMPAT_LAYER_TYPE} compatLayer)"), 2);
        output.push_skeleton("{", 2);
        output.push_skeleton("if (compatLayer == null)", 3);
        output.push_skeleton("throw new ArgumentNullException(\"compatLayer\");", 4);
        output.push_skeleton("_ = compatLayer;", 3);
        output.push_skeleton("}", 2);
        output.push_skeleton("", 2);
        output.push_skeleton("public void Go()", 2);
        output.push_skeleton("{", 2);
        output.push_skeleton(format!("Go(new {environment}());"), 3);
        output.push_skeleton("}", 2);
        output.push_skeleton("", 2);
        output.push_skeleton(format!("public void Go({environment} env)"), 2);
        output.push_skeleton("{", 2);
        output.push_skeleton("if (env == null)", 3);
        output.push_skeleton("throw new ArgumentNullException(\"env\");", 4);
        output.push_skeleton("", 3);
        output.push_skeleton("var _env = env;", 3);
        output.push_skeleton(format!("var _outer = new {outer}(_, _env);"), 3);
        output.translated_statements.extend(body);
        output.push_skeleton("}", 2);
        output.push_skeleton("}", 1);
    }

    fn emit_global_references(
        &self,
        globals: &[(EcoString, Option<Vec<usize>>, usize)],
        partition: &Partition<'_>,
        scope: &ScopeAccessInformation,
        output: &mut TranslationResult,
        warnings: &mut Vec<TranslationWarning>,
    ) -> Result<()> {
        let outer = self.options().outer_class_name();
        let environment = self.options().environment_class_name();

        output.push_skeleton(format!("public class {outer}"), 1);
        output.push_skeleton("{", 1);
        output.push_skeleton(format!("private readonly {COMPAT_LAYER_TYPE} _;"), 2);
        output.push_skeleton(format!("private readonly {outer} _outer;"), 2);
        output.push_skeleton(format!("private readonly {environment} _env;"), 2);
        output.push_skeleton(
            format!("public {outer}({COMPAT_LAYER_TYPE} compatLayer, {environment} env)"),
            2,
        );
        output.push_skeleton("{", 2);
        output.push_skeleton("if (compatLayer == null)", 3);
        output.push_skeleton("throw new ArgumentNullException(\"compatLayer\");", 4);
        output.push_skeleton("if (env == null)", 3);
        output.push_skeleton("throw new ArgumentNullException(\"env\");", 4);
        output.push_skeleton("_ = compatLayer;", 3);
        output.push_skeleton("_env = env;", 3);
        output.push_skeleton("_outer = this;", 3);
        for (name, dimensions, line_index) in globals {
            output.push(TranslatedStatement::new(
                format!("{name} = {};", initial_value(dimensions.as_deref())),
                3,
                *line_index,
            ));
        }
        output.push_skeleton("}", 2);

        for (name, _, line_index) in globals {
            output.push(TranslatedStatement::new(
                format!("public object {name} {{ get; set; }}"),
                2,
                *line_index,
            ));
        }

        for (comments, function) in &partition.functions {
            output.push_skeleton("", 2);
            for comment in comments {
                if let CodeBlock::Comment(comment) = comment {
                    output.push(TranslatedStatement::new(
                        format!("//{}", comment.token.content()),
                        2,
                        comment.token.line_index(),
                    ));
                }
            }
            let mut translated = self.translate_function(function, scope, 2)?;
            warnings.append(&mut translated.warnings);
            *output = std::mem::take(output).add(translated);
        }
        output.push_skeleton("}", 1);
        Ok(())
    }

    fn emit_environment_references(
        &self,
        environment: &[EnvironmentField],
        output: &mut TranslationResult,
    ) {
        output.push_skeleton(format!("public class {}", self.options().environment_class_name()), 1);
        output.push_skeleton("{", 1);
        for field in environment {
            let marker = if field.undeclared { " // Undeclared in source" } else { "" };
            output.push(TranslatedStatement::new(
                format!("public object {} {{ get; set; }}{marker}", field.rewritten),
                2,
                field.line_index,
            ));
        }
        output.push_skeleton("}", 1);
    }
}
