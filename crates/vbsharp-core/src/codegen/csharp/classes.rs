// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Class translation.
//!
//! **DDD Context:** Compilation — Code Generation
//!
//! A VBScript class becomes a sealed C# class holding the compat layer and
//! the two reference objects it was created with. `Dim`, `Private` and
//! `Public` members become auto-properties, routines become methods, and
//! `Class_Initialize` runs at the end of the constructor:
//!
//! ```csharp
//! [SourceClassName("Counter")]
//! public sealed class counter
//! {
//!     private readonly IProvideVBScriptCompatFunctionalityToIndividualRequests _;
//!     private readonly EnvironmentReferences _env;
//!     private readonly GlobalReferences _outer;
//!     public counter(IProvideVBScriptCompatFunctionalityToIndividualRequests compatLayer, EnvironmentReferences env, GlobalReferences outer)
//!     {
//!         ...
//!     }
//!
//!     private object total { get; set; }
//! }
//! ```
//!
//! `Class_Terminate` becomes a finalizer plus an explicit `IDisposable`
//! implementation that runs it at most once.

use ecow::EcoString;
use tracing::debug;

use crate::ast::{ClassBlock, CodeBlock, DeclarationKind, FunctionBlock, FunctionKind, Visibility};

use super::expressions::{ValueContext, generate_single};
use super::naming::csharp_string_literal;
use super::outer_scope::COMPAT_LAYER_TYPE;
use super::scope::{NameLocation, ScopeAccessInformation, ScopedName};
use super::{
    BlockOutcome, CodeBlockTranslator, Result, TranslatedStatement, TranslationError,
    TranslationResult, declarations::constant_dimensions, initial_value,
};

const INITIALIZE: &str = "Class_Initialize";
const TERMINATE: &str = "Class_Terminate";

/// A class-level variable or constant.
struct Field<'c> {
    name: EcoString,
    public: bool,
    line_index: usize,
    /// Constructor initialisation, when the field starts as something other
    /// than `null`.
    initialiser: Option<FieldInitialiser<'c>>,
}

enum FieldInitialiser<'c> {
    Array(Vec<usize>),
    Constant(&'c [crate::source_analysis::Token]),
}

/// The class body, split into what the C# class needs.
#[derive(Default)]
struct ClassMembers<'c> {
    fields: Vec<Field<'c>>,
    /// Routines and the comments and blank lines around them, in order.
    members: Vec<&'c CodeBlock>,
    initialize: Option<&'c FunctionBlock>,
    terminate: Option<&'c FunctionBlock>,
}

/// True for a routine with nothing but blank lines and comments inside.
fn is_empty_routine(function: &FunctionBlock) -> bool {
    function.statements.iter().all(CodeBlock::is_blank_or_comment)
}

fn is_valid_event_handler(function: &FunctionBlock) -> bool {
    function.kind == FunctionKind::Sub && function.parameters.is_empty()
}

impl CodeBlockTranslator {
    /// Translates `class` at `indentation_depth` (the depth of its
    /// declaration line).
    ///
    /// # Errors
    ///
    /// Returns [`TranslationError::DuplicateClassMember`] for names defined
    /// twice, [`TranslationError::InvalidClassInitializeOrTerminate`] for
    /// event handlers with arguments or a non-Sub kind, and
    /// [`TranslationError::UnsupportedConstruct`] for executable statements
    /// directly in the class body.
    pub(super) fn translate_class(
        &self,
        class: &ClassBlock,
        scope: &ScopeAccessInformation,
        indentation_depth: usize,
    ) -> Result<TranslationResult> {
        let class_name = self.rewrite_token(&class.name);
        let members = self.partition_class(class)?;
        let class_scope = self.class_scope(class, &class_name, &members, scope);
        debug!(
            "Translating class {} ({} fields, {} members)",
            class.name.content(),
            members.fields.len(),
            members.members.len()
        );

        let member_depth = indentation_depth + 1;
        let body_depth = member_depth + 1;
        let line_index = class.keyword.line_index();
        let mut result = TranslationResult::new();

        // The marker is a base class, so it precedes any interface.
        let mut bases = Vec::new();
        if has_public_indexed_property(class) {
            bases.push("TranslatedPropertyIReflectImplementation");
        }
        if members.terminate.is_some() {
            bases.push("IDisposable");
        }
        result.push(TranslatedStatement::new(
            format!("[SourceClassName({})]", csharp_string_literal(class.name.content())),
            indentation_depth,
            line_index,
        ));
        let declaration = if bases.is_empty() {
            format!("public sealed class {class_name}")
        } else {
            format!("public sealed class {class_name} : {}", bases.join(", "))
        };
        result.push(TranslatedStatement::new(declaration, indentation_depth, line_index));
        result.push_skeleton("{", indentation_depth);

        let environment = self.options().environment_class_name();
        let outer = self.options().outer_class_name();
        result.push_skeleton(format!("private readonly {COMPAT_LAYER_TYPE} _;"), member_depth);
        result.push_skeleton(format!("private readonly {environment} _env;"), member_depth);
        result.push_skeleton(format!("private readonly {outer} _outer;"), member_depth);

        let disposed = members.terminate.map(|_| {
            let (name, _) = class_scope.reserve_temp("disposed");
            name
        });
        if let Some(disposed) = &disposed {
            result.push_skeleton(format!("private bool {disposed};"), member_depth);
        }

        // Constructor
        result.push_skeleton(
            format!("public {class_name}({COMPAT_LAYER_TYPE} compatLayer, {environment} env, {outer} outer)"),
            member_depth,
        );
        result.push_skeleton("{", member_depth);
        for argument in ["compatLayer", "env", "outer"] {
            result.push_skeleton(format!("if ({argument} == null)"), body_depth);
            result.push_skeleton(
                format!("throw new ArgumentNullException(\"{argument}\");"),
                body_depth + 1,
            );
        }
        result.push_skeleton("_ = compatLayer;", body_depth);
        result.push_skeleton("_env = env;", body_depth);
        result.push_skeleton("_outer = outer;", body_depth);
        if let Some(disposed) = &disposed {
            result.push_skeleton(format!("{disposed} = false;"), body_depth);
        }
        for field in &members.fields {
            match &field.initialiser {
                None => {}
                Some(FieldInitialiser::Array(dimensions)) => result.push(TranslatedStatement::new(
                    format!("{} = {};", field.name, initial_value(Some(dimensions))),
                    body_depth,
                    field.line_index,
                )),
                Some(FieldInitialiser::Constant(tokens)) => {
                    let expression = generate_single(tokens, field.line_index)?;
                    let value =
                        self.translate_expression(&expression, &class_scope, ValueContext::Value, &mut result)?;
                    result.push(TranslatedStatement::new(
                        format!("{} = {value};", field.name),
                        body_depth,
                        field.line_index,
                    ));
                }
            }
        }
        if let Some(initialize) = members.initialize {
            result.push(TranslatedStatement::new(
                format!("{}();", self.method_name(initialize)),
                body_depth,
                initialize.keyword.line_index(),
            ));
        }
        result.push_skeleton("}", member_depth);

        if let (Some(terminate), Some(disposed)) = (members.terminate, &disposed) {
            self.emit_disposal(&class_name, terminate, disposed, member_depth, &mut result);
        }

        for field in &members.fields {
            let visibility = if field.public { "public" } else { "private" };
            result.push(TranslatedStatement::new(
                format!("{visibility} object {} {{ get; set; }}", field.name),
                member_depth,
                field.line_index,
            ));
        }

        for member in &members.members {
            result = match member {
                CodeBlock::Function(function) => {
                    let translated = self.translate_function(function, &class_scope, member_depth)?;
                    result.add(translated)
                }
                other => match self.translate_blank_line(other, &class_scope, member_depth, result)? {
                    BlockOutcome::Translated(translated) => translated,
                    BlockOutcome::NotApplicable(unchanged) => {
                        match self.translate_comment(other, &class_scope, member_depth, unchanged)? {
                            BlockOutcome::Translated(translated) | BlockOutcome::NotApplicable(translated) => {
                                translated
                            }
                        }
                    }
                },
            };
        }
        result.push_skeleton("}", indentation_depth);

        result.explicit_variable_declarations.clear();
        result.undeclared_variables_accessed.clear();
        result.reserved_names.clear();
        Ok(result)
    }

    /// Finalizer, `IDisposable.Dispose` and the guarded dispose method.
    fn emit_disposal(
        &self,
        class_name: &str,
        terminate: &FunctionBlock,
        disposed: &EcoString,
        depth: usize,
        result: &mut TranslationResult,
    ) {
        let line_index = terminate.keyword.line_index();
        let dispose = format!("dispose{}", disposed.trim_start_matches("disposed"));
        result.push_skeleton("", depth);
        result.push_skeleton(format!("~{class_name}()"), depth);
        result.push_skeleton("{", depth);
        result.push_skeleton("try", depth + 1);
        result.push_skeleton("{", depth + 1);
        result.push_skeleton(format!("{dispose}(false);"), depth + 2);
        result.push_skeleton("}", depth + 1);
        result.push_skeleton("catch { }", depth + 1);
        result.push_skeleton("}", depth);
        result.push_skeleton("", depth);
        result.push_skeleton("void IDisposable.Dispose()", depth);
        result.push_skeleton("{", depth);
        result.push_skeleton(format!("{dispose}(true);"), depth + 1);
        result.push_skeleton("GC.SuppressFinalize(this);", depth + 1);
        result.push_skeleton("}", depth);
        result.push_skeleton("", depth);
        result.push_skeleton(format!("private void {dispose}(bool disposing)"), depth);
        result.push_skeleton("{", depth);
        result.push_skeleton(format!("if ({disposed})"), depth + 1);
        result.push_skeleton("return;", depth + 2);
        result.push_skeleton(format!("{disposed} = true;"), depth + 1);
        result.push(TranslatedStatement::new(
            format!("{}();", self.method_name(terminate)),
            depth + 1,
            line_index,
        ));
        result.push_skeleton("}", depth);
        result.push_skeleton("", depth);
    }

    fn partition_class<'c>(&self, class: &'c ClassBlock) -> Result<ClassMembers<'c>> {
        let class_name = class.name.content();
        let mut members = ClassMembers::default();
        // (rewritten name, is property, accessor kind) for duplicate checks.
        let mut seen: Vec<(EcoString, Option<FunctionKind>)> = Vec::new();
        let mut check = |name: &crate::source_analysis::Token, kind: Option<FunctionKind>| {
            let rewritten = self.rewrite_token(name);
            let clashes = seen.iter().any(|(other, other_kind)| {
                other.eq_ignore_ascii_case(&rewritten)
                    && !(kind.is_some_and(FunctionKind::is_property)
                        && other_kind.is_some_and(FunctionKind::is_property)
                        && kind != *other_kind)
            });
            if clashes {
                return Err(TranslationError::DuplicateClassMember {
                    class: class_name.clone(),
                    name: name.content().clone(),
                    line: name.line_index() + 1,
                });
            }
            seen.push((rewritten, kind));
            Ok(())
        };

        for block in &class.statements {
            match block {
                CodeBlock::BlankLine(_) | CodeBlock::Comment(_) => members.members.push(block),
                CodeBlock::Dim(dim) => {
                    for variable in &dim.variables {
                        check(&variable.name, None)?;
                        members.fields.push(Field {
                            name: self.rewrite_token(&variable.name),
                            public: dim.kind != DeclarationKind::Private,
                            line_index: variable.name.line_index(),
                            initialiser: constant_dimensions(variable)?.map(FieldInitialiser::Array),
                        });
                    }
                }
                CodeBlock::Const(constant) => {
                    for value in &constant.values {
                        check(&value.name, None)?;
                        members.fields.push(Field {
                            name: self.rewrite_token(&value.name),
                            public: constant.visibility != Some(Visibility::Private),
                            line_index: value.name.line_index(),
                            initialiser: Some(FieldInitialiser::Constant(&value.value)),
                        });
                    }
                }
                CodeBlock::Function(function) => {
                    check(&function.name, Some(function.kind))?;
                    let is_initialize = function.name.content().eq_ignore_ascii_case(INITIALIZE);
                    let is_terminate = function.name.content().eq_ignore_ascii_case(TERMINATE);
                    if is_initialize || is_terminate {
                        if !is_valid_event_handler(function) {
                            return Err(TranslationError::InvalidClassInitializeOrTerminate {
                                name: function.name.content().clone(),
                                line: function.keyword.line_index() + 1,
                            });
                        }
                        if is_empty_routine(function) {
                            debug!("Dropping empty {} in class {class_name}", function.name.content());
                            continue;
                        }
                        if is_initialize {
                            members.initialize = Some(function);
                        } else {
                            members.terminate = Some(function);
                        }
                    }
                    members.members.push(block);
                }
                other => {
                    return Err(TranslationError::UnsupportedConstruct {
                        construct: other.description(),
                        line: other.line_index() + 1,
                    });
                }
            }
        }
        Ok(members)
    }

    /// The scope seen by member bodies: fields, routines and properties of
    /// this class on top of the outer scope.
    fn class_scope(
        &self,
        class: &ClassBlock,
        class_name: &EcoString,
        members: &ClassMembers<'_>,
        scope: &ScopeAccessInformation,
    ) -> ScopeAccessInformation {
        let fields = members.fields.iter().map(|field| {
            ScopedName::new(field.name.clone(), field.name.clone(), NameLocation::WithinClass, field.line_index)
        });
        let mut functions = Vec::new();
        let mut properties: Vec<ScopedName> = Vec::new();
        for block in &class.statements {
            let CodeBlock::Function(function) = block else {
                continue;
            };
            let scoped = ScopedName::new(
                function.name.content().clone(),
                self.rewrite_token(&function.name),
                NameLocation::WithinClass,
                function.name.line_index(),
            );
            if function.kind.is_property() {
                if !properties.iter().any(|p| p.rewritten == scoped.rewritten) {
                    properties.push(scoped);
                }
            } else {
                functions.push(scoped);
            }
        }
        scope
            .for_class(class_name.clone())
            .extend_variables(fields)
            .extend_functions(functions)
            .extend_properties(properties)
    }
}

fn has_public_indexed_property(class: &ClassBlock) -> bool {
    class.statements.iter().any(|block| {
        matches!(
            block,
            CodeBlock::Function(function)
                if function.kind == FunctionKind::PropertyGet
                    && function.visibility == Visibility::Public
                    && !function.parameters.is_empty()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::csharp::TranslatorOptions;
    use crate::source_analysis::{lex, parse};

    fn class(source: &str) -> ClassBlock {
        match parse(lex(source).unwrap()).unwrap().into_iter().next() {
            Some(CodeBlock::Class(class)) => class,
            other => panic!("expected a class, got {other:?}"),
        }
    }

    fn translate(source: &str) -> Result<Vec<String>> {
        let class = class(source);
        let scope = ScopeAccessInformation::outermost([]);
        Ok(CodeBlockTranslator::new(TranslatorOptions::default())
            .translate_class(&class, &scope, 0)?
            .translated_statements
            .into_iter()
            .map(|s| s.content)
            .collect())
    }

    #[test]
    fn fields_become_properties() {
        let lines = translate("Class Point\n  Public X\n  Private y\nEnd Class\n").unwrap();
        assert_eq!(lines[0], "[SourceClassName(\"Point\")]");
        assert_eq!(lines[1], "public sealed class point");
        assert!(lines.contains(&"public object x { get; set; }".to_string()));
        assert!(lines.contains(&"private object y { get; set; }".to_string()));
    }

    #[test]
    fn initialize_runs_from_constructor() {
        let lines = translate("Class C\n  Private Sub Class_Initialize()\n    n = 1\n  End Sub\n  Dim n\nEnd Class\n").unwrap();
        assert!(lines.contains(&"class_initialize();".to_string()));
        assert!(lines.contains(&"private void class_initialize()".to_string()));
        assert!(lines.contains(&"n = 1;".to_string()));
    }

    #[test]
    fn empty_initialize_is_dropped() {
        let lines = translate("Class C\n  Sub Class_Initialize()\n  End Sub\nEnd Class\n").unwrap();
        assert!(!lines.iter().any(|l| l.contains("class_initialize")));
    }

    #[test]
    fn terminate_implements_disposable() {
        let lines = translate("Class C\n  Sub Class_Terminate()\n    x = 1\n  End Sub\nEnd Class\n").unwrap();
        assert_eq!(lines[1], "public sealed class c : IDisposable");
        assert!(lines.contains(&"~c()".to_string()));
        assert!(lines.contains(&"void IDisposable.Dispose()".to_string()));
        assert!(lines.contains(&"class_terminate();".to_string()));
    }

    #[test]
    fn initialize_with_arguments_is_rejected() {
        let error = translate("Class C\n  Sub Class_Initialize(a)\n    a = 1\n  End Sub\nEnd Class\n").unwrap_err();
        assert!(matches!(error, TranslationError::InvalidClassInitializeOrTerminate { .. }));
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let error = translate("Class C\n  Function F()\n  End Function\n  Sub f()\n  End Sub\nEnd Class\n").unwrap_err();
        assert!(matches!(error, TranslationError::DuplicateClassMember { .. }));
    }

    #[test]
    fn property_accessor_pairs_are_allowed() {
        let lines = translate(
            "Class C\n  Private v\n  Public Property Get Value()\n    Value = v\n  End Property\n  Public Property Let Value(x)\n    v = x\n  End Property\nEnd Class\n",
        )
        .unwrap();
        assert!(lines.contains(&"public object get_value()".to_string()));
        assert!(lines.contains(&"public void let_value(ref object x)".to_string()));
        assert!(lines.contains(&"[TranslatedProperty(\"Value\")]".to_string()));
    }

    #[test]
    fn public_indexed_property_adds_marker_base() {
        let lines = translate("Class C\n  Public Property Get Item(i)\n    Item = i\n  End Property\nEnd Class\n").unwrap();
        assert_eq!(lines[1], "public sealed class c : TranslatedPropertyIReflectImplementation");
    }

    #[test]
    fn marker_base_precedes_disposable() {
        let lines = translate(
            "Class C\n  Public Property Get Item(i)\n    Item = i\n  End Property\n  Sub Class_Terminate()\n    x = 1\n  End Sub\nEnd Class\n",
        )
        .unwrap();
        assert_eq!(
            lines[1],
            "public sealed class c : TranslatedPropertyIReflectImplementation, IDisposable"
        );
    }

    #[test]
    fn statements_in_class_body_are_unsupported() {
        let error = translate("Class C\n  x = 1\nEnd Class\n").unwrap_err();
        assert!(matches!(error, TranslationError::UnsupportedConstruct { .. }));
    }
}
