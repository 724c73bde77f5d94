// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Immutable scope snapshot threaded through the block translators.
//!
//! **DDD Context:** Compilation — Code Generation
//!
//! [`ScopeAccessInformation`] answers "what does this name refer to here?"
//! and "which temporary name is free?". Translators never mutate it: every
//! nested construct derives a new snapshot through the `extend_*`/`with_*`
//! methods. The tables are [`EcoVec`]s, so a derived snapshot shares storage
//! with its parent until it adds something.
//!
//! Lookups search from the end of each table so that the innermost
//! declaration of a name wins (a class method shadows an outermost
//! function of the same name).

use ecow::{EcoString, EcoVec};

use crate::ast::{FunctionKind, Parameter};

/// Where a name was declared. Decides how a reference renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLocation {
    /// A field of the outer references object, `_outer.x`.
    OutermostScope,
    /// A field of the environment references object, `_env.x`.
    Environment,
    /// A member of the class being translated.
    WithinClass,
    /// A local or parameter of the routine being translated.
    WithinFunctionOrProperty,
}

/// A declared variable, function, property or class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedName {
    pub source_name: EcoString,
    pub rewritten: EcoString,
    pub location: NameLocation,
    pub by_ref_parameter: bool,
    pub line_index: usize,
}

impl ScopedName {
    #[must_use]
    pub fn new(
        source_name: impl Into<EcoString>,
        rewritten: impl Into<EcoString>,
        location: NameLocation,
        line_index: usize,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            rewritten: rewritten.into(),
            location,
            by_ref_parameter: false,
            line_index,
        }
    }

    #[must_use]
    pub fn as_by_ref_parameter(mut self) -> Self {
        self.by_ref_parameter = true;
        self
    }
}

/// The construct whose children are being translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentConstruct {
    Outermost,
    Class,
    Function,
    If,
    Select,
    For,
    ForEach,
    Do,
    With,
}

impl ParentConstruct {
    /// Outermost, class and function/property bodies own declarations.
    #[must_use]
    pub fn is_scope_defining(self) -> bool {
        matches!(self, Self::Outermost | Self::Class | Self::Function)
    }
}

/// The nearest construct that owns declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDefiningParent {
    Outermost,
    Class {
        name: EcoString,
    },
    Function {
        /// Rewritten routine name.
        name: EcoString,
        kind: FunctionKind,
        parameters: EcoVec<Parameter>,
        within_class: bool,
    },
}

/// Where translated code will run. Derived from the scope-defining parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeLocation {
    OutermostScope,
    WithinClass,
    WithinFunctionOrProperty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    Do,
}

/// A loop on the enclosing-loop stack.
///
/// `exit_flag` is set when an `Exit` of this loop's kind is buried inside
/// a loop of the other kind and must propagate through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureExitPoint {
    pub kind: LoopKind,
    pub exit_flag: Option<EcoString>,
}

/// A local standing in for a by-ref parameter inside a closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByRefAlias {
    pub parameter: EcoString,
    pub alias: EcoString,
}

/// See the module docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeAccessInformation {
    parent: ParentConstruct,
    scope_defining_parent: ScopeDefiningParent,
    parent_return_value_name: Option<EcoString>,
    error_registration_token: Option<EcoString>,
    directed_with_reference: Option<EcoString>,
    external_dependencies: EcoVec<EcoString>,
    classes: EcoVec<ScopedName>,
    functions: EcoVec<ScopedName>,
    properties: EcoVec<ScopedName>,
    variables: EcoVec<ScopedName>,
    structure_exit_points: EcoVec<StructureExitPoint>,
    by_ref_aliases: EcoVec<ByRefAlias>,
    reserved_names: EcoVec<EcoString>,
}

impl ScopeAccessInformation {
    /// The outermost scope of a program.
    ///
    /// External dependencies become environment variables.
    #[must_use]
    pub fn outermost(external_dependencies: impl IntoIterator<Item = ScopedName>) -> Self {
        let dependencies: EcoVec<ScopedName> = external_dependencies.into_iter().collect();
        Self {
            parent: ParentConstruct::Outermost,
            scope_defining_parent: ScopeDefiningParent::Outermost,
            parent_return_value_name: None,
            error_registration_token: None,
            directed_with_reference: None,
            external_dependencies: dependencies.iter().map(|d| d.rewritten.clone()).collect(),
            classes: EcoVec::new(),
            functions: EcoVec::new(),
            properties: EcoVec::new(),
            variables: dependencies,
            structure_exit_points: EcoVec::new(),
            by_ref_aliases: EcoVec::new(),
            reserved_names: EcoVec::new(),
        }
    }

    #[must_use]
    pub fn parent(&self) -> ParentConstruct {
        self.parent
    }

    #[must_use]
    pub fn scope_defining_parent(&self) -> &ScopeDefiningParent {
        &self.scope_defining_parent
    }

    #[must_use]
    pub fn location(&self) -> ScopeLocation {
        match self.scope_defining_parent {
            ScopeDefiningParent::Outermost => ScopeLocation::OutermostScope,
            ScopeDefiningParent::Class { .. } => ScopeLocation::WithinClass,
            ScopeDefiningParent::Function { .. } => ScopeLocation::WithinFunctionOrProperty,
        }
    }

    /// Where a variable declared at this point lives.
    #[must_use]
    pub fn declaration_location(&self) -> NameLocation {
        match self.location() {
            ScopeLocation::OutermostScope => NameLocation::OutermostScope,
            ScopeLocation::WithinClass => NameLocation::WithinClass,
            ScopeLocation::WithinFunctionOrProperty => NameLocation::WithinFunctionOrProperty,
        }
    }

    /// True inside a class body or one of its methods.
    #[must_use]
    pub fn is_within_class(&self) -> bool {
        match &self.scope_defining_parent {
            ScopeDefiningParent::Outermost => false,
            ScopeDefiningParent::Class { .. } => true,
            ScopeDefiningParent::Function { within_class, .. } => *within_class,
        }
    }

    #[must_use]
    pub fn parent_return_value_name(&self) -> Option<&EcoString> {
        self.parent_return_value_name.as_ref()
    }

    #[must_use]
    pub fn error_registration_token(&self) -> Option<&EcoString> {
        self.error_registration_token.as_ref()
    }

    #[must_use]
    pub fn directed_with_reference(&self) -> Option<&EcoString> {
        self.directed_with_reference.as_ref()
    }

    #[must_use]
    pub fn external_dependencies(&self) -> &[EcoString] {
        &self.external_dependencies
    }

    #[must_use]
    pub fn structure_exit_points(&self) -> &[StructureExitPoint] {
        &self.structure_exit_points
    }

    #[must_use]
    pub fn reserved_names(&self) -> &[EcoString] {
        &self.reserved_names
    }

    // --- derivation ---

    #[must_use]
    pub fn set_parent(&self, parent: ParentConstruct) -> Self {
        Self {
            parent,
            ..self.clone()
        }
    }

    /// Enters a class body. Variables of the outermost scope stay visible.
    #[must_use]
    pub fn for_class(&self, name: impl Into<EcoString>) -> Self {
        Self {
            parent: ParentConstruct::Class,
            scope_defining_parent: ScopeDefiningParent::Class { name: name.into() },
            parent_return_value_name: None,
            error_registration_token: None,
            directed_with_reference: None,
            structure_exit_points: EcoVec::new(),
            by_ref_aliases: EcoVec::new(),
            ..self.clone()
        }
    }

    /// Enters a function or property body; parameters become locals.
    #[must_use]
    pub fn for_function(
        &self,
        name: impl Into<EcoString>,
        kind: FunctionKind,
        parameters: impl IntoIterator<Item = (Parameter, EcoString)>,
    ) -> Self {
        let within_class = self.is_within_class();
        let mut variables = self.variables.clone();
        let mut declared = EcoVec::new();
        for (parameter, rewritten) in parameters {
            let mut scoped = ScopedName::new(
                parameter.name.content().clone(),
                rewritten,
                NameLocation::WithinFunctionOrProperty,
                parameter.name.line_index(),
            );
            scoped.by_ref_parameter = parameter.by_ref;
            variables.push(scoped);
            declared.push(parameter);
        }
        Self {
            parent: ParentConstruct::Function,
            scope_defining_parent: ScopeDefiningParent::Function {
                name: name.into(),
                kind,
                parameters: declared,
                within_class,
            },
            parent_return_value_name: None,
            error_registration_token: None,
            directed_with_reference: None,
            variables,
            structure_exit_points: EcoVec::new(),
            by_ref_aliases: EcoVec::new(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_return_value_name(&self, name: Option<EcoString>) -> Self {
        Self {
            parent_return_value_name: name,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_error_registration_token(&self, token: Option<EcoString>) -> Self {
        Self {
            error_registration_token: token,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_directed_with_reference(&self, reference: impl Into<EcoString>) -> Self {
        Self {
            directed_with_reference: Some(reference.into()),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn add_structure_exit_point(&self, exit_point: StructureExitPoint) -> Self {
        let mut scope = self.clone();
        scope.structure_exit_points.push(exit_point);
        scope
    }

    #[must_use]
    pub fn extend_variables(&self, names: impl IntoIterator<Item = ScopedName>) -> Self {
        let mut scope = self.clone();
        scope.variables.extend(names);
        scope
    }

    #[must_use]
    pub fn extend_functions(&self, names: impl IntoIterator<Item = ScopedName>) -> Self {
        let mut scope = self.clone();
        scope.functions.extend(names);
        scope
    }

    #[must_use]
    pub fn extend_properties(&self, names: impl IntoIterator<Item = ScopedName>) -> Self {
        let mut scope = self.clone();
        scope.properties.extend(names);
        scope
    }

    #[must_use]
    pub fn extend_classes(&self, names: impl IntoIterator<Item = ScopedName>) -> Self {
        let mut scope = self.clone();
        scope.classes.extend(names);
        scope
    }

    /// Adds reserved names that are not already known.
    #[must_use]
    pub fn extend_reserved<'n>(&self, names: impl IntoIterator<Item = &'n EcoString>) -> Self {
        let mut scope = self.clone();
        for name in names {
            if !scope.reserved_names.iter().any(|r| r == name) {
                scope.reserved_names.push(name.clone());
            }
        }
        scope
    }

    #[must_use]
    pub fn extend_by_ref_aliases(&self, aliases: impl IntoIterator<Item = ByRefAlias>) -> Self {
        let mut scope = self.clone();
        scope.by_ref_aliases.extend(aliases);
        scope
    }

    // --- lookups (by rewritten name) ---

    #[must_use]
    pub fn find_variable(&self, rewritten: &str) -> Option<&ScopedName> {
        find(&self.variables, rewritten)
    }

    #[must_use]
    pub fn find_function(&self, rewritten: &str) -> Option<&ScopedName> {
        find(&self.functions, rewritten)
    }

    #[must_use]
    pub fn find_property(&self, rewritten: &str) -> Option<&ScopedName> {
        find(&self.properties, rewritten)
    }

    #[must_use]
    pub fn find_class(&self, rewritten: &str) -> Option<&ScopedName> {
        find(&self.classes, rewritten)
    }

    /// The alias currently standing in for a by-ref parameter.
    #[must_use]
    pub fn by_ref_alias(&self, parameter: &str) -> Option<&EcoString> {
        self.by_ref_aliases
            .iter()
            .rev()
            .find(|alias| alias.parameter.eq_ignore_ascii_case(parameter))
            .map(|alias| &alias.alias)
    }

    /// A by-ref parameter of the current routine with no active alias.
    #[must_use]
    pub fn is_unaliased_by_ref_parameter(&self, rewritten: &str) -> bool {
        self.location() == ScopeLocation::WithinFunctionOrProperty
            && self
                .find_variable(rewritten)
                .is_some_and(|v| v.by_ref_parameter)
            && self.by_ref_alias(rewritten).is_none()
    }

    /// True when the name is the current function or property, whose
    /// assignments set the return value.
    #[must_use]
    pub fn is_current_routine(&self, rewritten: &str) -> bool {
        matches!(
            &self.scope_defining_parent,
            ScopeDefiningParent::Function { name, .. } if name.eq_ignore_ascii_case(rewritten)
        )
    }

    /// True when the name is visible as anything at all.
    #[must_use]
    pub fn is_name_taken(&self, rewritten: &str) -> bool {
        self.find_variable(rewritten).is_some()
            || self.find_function(rewritten).is_some()
            || self.find_property(rewritten).is_some()
            || self.find_class(rewritten).is_some()
            || self
                .reserved_names
                .iter()
                .any(|r| r.eq_ignore_ascii_case(rewritten))
            || self
                .by_ref_aliases
                .iter()
                .any(|a| a.alias.eq_ignore_ascii_case(rewritten))
    }

    /// The first `{base}{n}` (n ≥ 1) not visible in this scope.
    #[must_use]
    pub fn next_temp_name(&self, base: &str) -> EcoString {
        (1..)
            .map(|n| EcoString::from(format!("{base}{n}")))
            .find(|candidate| !self.is_name_taken(candidate))
            .unwrap_or_else(|| base.into())
    }

    /// Issues a temporary name and returns a scope in which it is taken.
    #[must_use]
    pub fn reserve_temp(&self, base: &str) -> (EcoString, Self) {
        let name = self.next_temp_name(base);
        let scope = self.extend_reserved([&name]);
        (name, scope)
    }
}

fn find<'s>(table: &'s EcoVec<ScopedName>, rewritten: &str) -> Option<&'s ScopedName> {
    table
        .iter()
        .rev()
        .find(|entry| entry.rewritten.eq_ignore_ascii_case(rewritten))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{Token, TokenKind};

    fn name(n: &str, location: NameLocation) -> ScopedName {
        ScopedName::new(n, n.to_lowercase(), location, 0)
    }

    fn parameter(n: &str, by_ref: bool) -> (Parameter, EcoString) {
        (
            Parameter {
                name: Token::new(TokenKind::Name, n, 0),
                by_ref,
                is_array: false,
            },
            n.to_lowercase().into(),
        )
    }

    #[test]
    fn temp_names_skip_taken_names() {
        let scope = ScopeAccessInformation::outermost([])
            .extend_variables([name("ifResult1", NameLocation::OutermostScope)]);
        assert_eq!(scope.next_temp_name("ifResult"), "ifResult2");
        let (issued, scope) = scope.reserve_temp("ifResult");
        assert_eq!(issued, "ifResult2");
        assert_eq!(scope.next_temp_name("ifResult"), "ifResult3");
    }

    #[test]
    fn temp_names_are_case_insensitive() {
        let scope = ScopeAccessInformation::outermost([])
            .extend_functions([name("LOOPSTART1", NameLocation::OutermostScope)]);
        assert_eq!(scope.next_temp_name("loopStart"), "loopStart2");
    }

    #[test]
    fn derivation_does_not_touch_the_original() {
        let outer = ScopeAccessInformation::outermost([]);
        let inner = outer.extend_variables([name("x", NameLocation::OutermostScope)]);
        assert!(outer.find_variable("x").is_none());
        assert!(inner.find_variable("x").is_some());
    }

    #[test]
    fn innermost_declaration_wins() {
        let scope = ScopeAccessInformation::outermost([])
            .extend_functions([name("f", NameLocation::OutermostScope)])
            .for_class("c")
            .extend_functions([name("f", NameLocation::WithinClass)]);
        assert_eq!(
            scope.find_function("F").map(|f| f.location),
            Some(NameLocation::WithinClass)
        );
    }

    #[test]
    fn function_scope_registers_parameters() {
        let scope = ScopeAccessInformation::outermost([]).for_function(
            "f",
            FunctionKind::Function,
            [parameter("a", true), parameter("b", false)],
        );
        assert_eq!(scope.location(), ScopeLocation::WithinFunctionOrProperty);
        assert!(scope.is_unaliased_by_ref_parameter("a"));
        assert!(!scope.is_unaliased_by_ref_parameter("b"));
        assert!(scope.is_current_routine("F"));

        let aliased = scope.extend_by_ref_aliases([ByRefAlias {
            parameter: "a".into(),
            alias: "byrefalias1".into(),
        }]);
        assert!(!aliased.is_unaliased_by_ref_parameter("a"));
        assert_eq!(aliased.next_temp_name("byrefalias"), "byrefalias2");
    }

    #[test]
    fn external_dependencies_are_environment_variables() {
        let scope = ScopeAccessInformation::outermost([name("wscript", NameLocation::Environment)]);
        assert_eq!(scope.external_dependencies().len(), 1);
        assert_eq!(
            scope.find_variable("wscript").map(|v| v.location),
            Some(NameLocation::Environment)
        );
    }

    #[test]
    fn class_scope_is_not_a_function() {
        let scope = ScopeAccessInformation::outermost([]).for_class("c");
        assert_eq!(scope.location(), ScopeLocation::WithinClass);
        assert!(scope.is_within_class());
        let method = scope.for_function("m", FunctionKind::Sub, []);
        assert!(method.is_within_class());
        assert!(ParentConstruct::Function.is_scope_defining());
        assert!(!ParentConstruct::If.is_scope_defining());
    }
}
